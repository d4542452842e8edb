//! The module graph store and its frozen read-only view.

use crate::arena::Arena;
use crate::ids::{ModuleId, NetId, PortId};
use crate::module::{Instance, Module, ModuleKind};
use crate::net::{InstanceRef, Net, PinRef, PortRef};
use crate::port::{Port, PortDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;
use weft_common::{FabricError, FabricResult};

/// The mutable module graph used during the build phase.
///
/// Module names are unique. A name, once taken, always resolves to the same
/// [`ModuleId`], so [`find_module`](Self::find_module) tells a builder
/// whether a name is still free.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    modules: Arena<ModuleId, Module>,
    by_name: HashMap<String, ModuleId>,
}

impl ModuleGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a module. Fails if the name is already taken.
    pub fn add_module(&mut self, name: impl Into<String>, kind: ModuleKind) -> FabricResult<ModuleId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(FabricError::consistency(format!(
                "module '{name}' already exists"
            )));
        }
        let id = ModuleId::from_raw(self.modules.len() as u32);
        self.modules.alloc(Module::new(id, name.clone(), kind));
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Looks up a module by name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a module by name, failing if it does not exist.
    pub fn module_id(&self, name: &str) -> FabricResult<ModuleId> {
        self.find_module(name)
            .ok_or_else(|| FabricError::lookup(format!("no module named '{name}'")))
    }

    /// Returns the module with the given ID.
    ///
    /// Library code uses [`try_module`](Self::try_module) instead.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not allocated by this graph.
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id]
    }

    /// Returns the module with the given ID, failing if it does not exist.
    pub fn try_module(&self, id: ModuleId) -> FabricResult<&Module> {
        self.modules
            .get(id)
            .ok_or_else(|| FabricError::lookup(format!("no module with id {}", id.as_raw())))
    }

    /// Iterates over all modules in creation order.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter()
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if the graph holds no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Adds a port to a module.
    pub fn add_port(
        &mut self,
        module: ModuleId,
        name: impl Into<String>,
        direction: PortDirection,
        width: u32,
    ) -> FabricResult<PortId> {
        let name = name.into();
        let m = self.module_mut(module)?;
        if width == 0 {
            return Err(FabricError::consistency(format!(
                "port '{name}' of module '{}' has zero width",
                m.name
            )));
        }
        if m.port_index.contains_key(&name) {
            return Err(FabricError::consistency(format!(
                "module '{}' already has a port '{name}'",
                m.name
            )));
        }
        let id = m.ports.alloc(Port {
            name: name.clone(),
            direction,
            width,
        });
        m.port_index.insert(name, id);
        Ok(id)
    }

    /// Instantiates `child` inside `parent` and returns the new instance's
    /// dense index among the parent's instances of `child`.
    pub fn add_child(&mut self, parent: ModuleId, child: ModuleId) -> FabricResult<u32> {
        let child_module = self.try_module(child)?;
        if parent == child {
            return Err(FabricError::structural(format!(
                "module '{}' cannot instantiate itself",
                child_module.name
            )));
        }
        let m = self.module_mut(parent)?;
        let index = m.instance_count(child);
        m.children.push(Instance {
            module: child,
            index,
            name: None,
        });
        Ok(index)
    }

    /// Instantiates `child` inside `parent` with a binding name.
    pub fn add_named_child(
        &mut self,
        parent: ModuleId,
        child: ModuleId,
        name: impl Into<String>,
    ) -> FabricResult<InstanceRef> {
        let index = self.add_child(parent, child)?;
        let instance = InstanceRef::new(child, index);
        self.set_instance_name(parent, instance, name)?;
        Ok(instance)
    }

    /// Sets the binding name of an existing instance.
    pub fn set_instance_name(
        &mut self,
        parent: ModuleId,
        instance: InstanceRef,
        name: impl Into<String>,
    ) -> FabricResult<()> {
        let m = self.module_mut(parent)?;
        let parent_name = m.name.clone();
        let inst = m
            .children
            .iter_mut()
            .find(|i| i.module == instance.module && i.index == instance.index)
            .ok_or_else(|| missing_instance(&parent_name, instance))?;
        inst.name = Some(name.into());
        Ok(())
    }

    /// Binding name of an instance, or `<module>_<index>` when it has none.
    pub fn instance_name(&self, parent: ModuleId, instance: InstanceRef) -> FabricResult<String> {
        let owner = self.try_module(parent)?;
        let inst = owner
            .instance(instance)
            .ok_or_else(|| missing_instance(&owner.name, instance))?;
        match &inst.name {
            Some(name) => Ok(name.clone()),
            None => Ok(format!(
                "{}_{}",
                self.try_module(instance.module)?.name,
                instance.index
            )),
        }
    }

    /// Marks an existing instance as the next configurable child of `parent`.
    pub fn add_configurable_child(
        &mut self,
        parent: ModuleId,
        instance: InstanceRef,
    ) -> FabricResult<()> {
        let m = self.module_mut(parent)?;
        if m.instance(instance).is_none() {
            return Err(missing_instance(&m.name, instance));
        }
        if m.configurable_children.contains(&instance) {
            return Err(FabricError::consistency(format!(
                "instance {} of module {} is already configurable in '{}'",
                instance.index,
                instance.module.as_raw(),
                m.name
            )));
        }
        m.configurable_children.push(instance);
        Ok(())
    }

    /// Creates an empty net inside `module`.
    pub fn create_net(&mut self, module: ModuleId) -> FabricResult<NetId> {
        Ok(self.module_mut(module)?.nets.alloc(Net::default()))
    }

    /// Attaches the source pin of a net. A net has exactly one source.
    pub fn set_net_source(&mut self, module: ModuleId, net: NetId, source: PinRef) -> FabricResult<()> {
        self.check_source(module, &source)?;
        let m = self.module_mut(module)?;
        let Some(n) = m.nets.get_mut(net) else {
            return Err(missing_net(&m.name, net));
        };
        if n.source.is_some() {
            return Err(FabricError::consistency(format!(
                "net {} in module '{}' already has a source",
                net.as_raw(),
                m.name
            )));
        }
        n.source = Some(source);
        Ok(())
    }

    /// Attaches one more sink pin to a net.
    pub fn add_net_sink(&mut self, module: ModuleId, net: NetId, sink: PinRef) -> FabricResult<()> {
        self.check_sink(module, &sink)?;
        let m = self.module_mut(module)?;
        let Some(n) = m.nets.get_mut(net) else {
            return Err(missing_net(&m.name, net));
        };
        n.sinks.push(sink);
        Ok(())
    }

    /// Creates a net from `source` to `sink`.
    pub fn connect(&mut self, module: ModuleId, source: PinRef, sink: PinRef) -> FabricResult<NetId> {
        self.fan_out(module, source, &[sink])
    }

    /// Creates a net from `source` to every pin in `sinks`.
    pub fn fan_out(
        &mut self,
        module: ModuleId,
        source: PinRef,
        sinks: &[PinRef],
    ) -> FabricResult<NetId> {
        self.check_source(module, &source)?;
        for sink in sinks {
            self.check_sink(module, sink)?;
        }
        let m = self.module_mut(module)?;
        Ok(m.nets.alloc(Net {
            source: Some(source),
            sinks: sinks.to_vec(),
        }))
    }

    /// Connects two ports of equal width pin by pin.
    pub fn connect_ports(
        &mut self,
        module: ModuleId,
        source: PortRef,
        sink: PortRef,
    ) -> FabricResult<()> {
        let src_width = self.resolve_pin(module, &source.pin(0))?.width;
        let sink_width = self.resolve_pin(module, &sink.pin(0))?.width;
        if src_width != sink_width {
            return Err(FabricError::consistency(format!(
                "cannot connect a {src_width}-bit port to a {sink_width}-bit port in module '{}'",
                self.try_module(module)?.name
            )));
        }
        for pin in 0..src_width {
            self.connect(module, source.pin(pin), sink.pin(pin))?;
        }
        Ok(())
    }

    /// Resolves the port a pin reference points at, checking that the
    /// instance exists and the pin is within the port's width.
    pub fn resolve_pin(&self, module: ModuleId, pin: &PinRef) -> FabricResult<&Port> {
        let owner = self.try_module(module)?;
        let target = match pin.instance {
            None => owner,
            Some(instance) => {
                if owner.instance(instance).is_none() {
                    return Err(missing_instance(&owner.name, instance));
                }
                self.try_module(instance.module)?
            }
        };
        let port = target.port(pin.port).ok_or_else(|| {
            FabricError::lookup(format!(
                "module '{}' has no port {}",
                target.name,
                pin.port.as_raw()
            ))
        })?;
        if pin.pin >= port.width {
            return Err(FabricError::consistency(format!(
                "pin {} is out of range for {}-bit port '{}' of module '{}'",
                pin.pin, port.width, port.name, target.name
            )));
        }
        Ok(port)
    }

    fn check_source(&self, module: ModuleId, source: &PinRef) -> FabricResult<()> {
        let port = self.resolve_pin(module, source)?;
        let can_drive = match source.instance {
            None => port.direction.is_inward(),
            Some(_) => !port.direction.is_inward() || port.direction == PortDirection::InOut,
        };
        if !can_drive {
            return Err(FabricError::consistency(format!(
                "port '{}' cannot drive a net in module '{}'",
                port.name,
                self.try_module(module)?.name
            )));
        }
        Ok(())
    }

    fn check_sink(&self, module: ModuleId, sink: &PinRef) -> FabricResult<()> {
        let port = self.resolve_pin(module, sink)?;
        let can_sink = match sink.instance {
            None => !port.direction.is_inward() || port.direction == PortDirection::InOut,
            Some(_) => port.direction.is_inward(),
        };
        if !can_sink {
            return Err(FabricError::consistency(format!(
                "port '{}' cannot be driven by a net in module '{}'",
                port.name,
                self.try_module(module)?.name
            )));
        }
        Ok(())
    }

    /// Ends the build phase.
    ///
    /// Every net must have a source and at least one sink.
    pub fn freeze(self) -> FabricResult<FrozenModuleGraph> {
        for (_, module) in self.modules.iter() {
            for (net_id, net) in module.nets.iter() {
                if net.source.is_none() {
                    return Err(FabricError::consistency(format!(
                        "net {} in module '{}' has no source",
                        net_id.as_raw(),
                        module.name
                    )));
                }
                if net.sinks.is_empty() {
                    return Err(FabricError::consistency(format!(
                        "net {} in module '{}' has no sink",
                        net_id.as_raw(),
                        module.name
                    )));
                }
            }
        }
        Ok(FrozenModuleGraph { graph: self })
    }

    fn module_mut(&mut self, id: ModuleId) -> FabricResult<&mut Module> {
        self.modules
            .get_mut(id)
            .ok_or_else(|| FabricError::lookup(format!("no module with id {}", id.as_raw())))
    }
}

fn missing_net(module: &str, net: NetId) -> FabricError {
    FabricError::lookup(format!("no net {} in module '{module}'", net.as_raw()))
}

fn missing_instance(parent: &str, instance: InstanceRef) -> FabricError {
    FabricError::lookup(format!(
        "module '{parent}' has no instance {} of module {}",
        instance.index,
        instance.module.as_raw()
    ))
}

/// A validated module graph in its read phase.
///
/// Only shared access is available, through `Deref` to [`ModuleGraph`]; all
/// mutating operations need `&mut ModuleGraph` and are therefore out of reach.
#[derive(Debug, Clone, Serialize)]
pub struct FrozenModuleGraph {
    graph: ModuleGraph,
}

impl Deref for FrozenModuleGraph {
    type Target = ModuleGraph;

    fn deref(&self) -> &ModuleGraph {
        &self.graph
    }
}
