//! SDC directives and file rendering.

use std::fmt;
use std::fmt::Write as _;

/// A `set_max_delay` path constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxDelay {
    /// Hierarchical source port, `<block>/<port>`.
    pub from: String,
    /// Hierarchical destination port, `<block>/<port>`.
    pub to: String,
    /// Maximum allowed delay in nanoseconds.
    pub delay_ns: f64,
}

impl fmt::Display for MaxDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "set_max_delay -from {} -to {} {}",
            self.from, self.to, self.delay_ns
        )
    }
}

/// Renders a constraint file: a header comment, then one directive per line.
pub fn render_sdc(description: &str, directives: &[MaxDelay]) -> String {
    let rule = "#".repeat(60);
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "# Synopsys Design Constraints (SDC)");
    let _ = writeln!(out, "# {description}");
    let _ = writeln!(out, "# Generated by weft {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "{rule}");
    for directive in directives {
        let _ = writeln!(out, "{directive}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_format() {
        let d = MaxDelay {
            from: "sb_1__1_/chanx_left_in_0".to_string(),
            to: "sb_1__1_/chanx_right_out_0".to_string(),
            delay_ns: 7.0,
        };
        assert_eq!(
            d.to_string(),
            "set_max_delay -from sb_1__1_/chanx_left_in_0 -to sb_1__1_/chanx_right_out_0 7"
        );
        let half = MaxDelay {
            delay_ns: 0.5,
            ..d
        };
        assert!(half.to_string().ends_with(" 0.5"));
    }

    #[test]
    fn file_layout() {
        let text = render_sdc(
            "Routing multiplexers of sb_0__0_",
            &[MaxDelay {
                from: "a/in".to_string(),
                to: "a/out".to_string(),
                delay_ns: 1.25,
            }],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[..5].iter().all(|l| l.starts_with('#')));
        assert_eq!(lines[1], "# Synopsys Design Constraints (SDC)");
        assert_eq!(lines[5], "set_max_delay -from a/in -to a/out 1.25");
        assert!(text.ends_with('\n'));
    }
}
