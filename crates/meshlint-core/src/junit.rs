//! JUnit XML output renderer.
//!
//! Converts a RunReceipt to JUnit XML for CI systems that collect test
//! reports.

use meshlint_types::{CheckOutcome, CheckStatus, RunReceipt};

/// Renders a RunReceipt as a JUnit XML report.
///
/// The structure is:
/// - `<testsuites>` - root element, one per receipt
/// - `<testsuite>` - one per check category, in report order
/// - `<testcase>` - one per executed check
/// - `<failure>` / `<error>` - for failing and errored checks
pub fn render_junit_for_receipt(receipt: &RunReceipt) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let mut suites: Vec<(&str, Vec<&CheckOutcome>)> = Vec::new();
    for c in &receipt.checks {
        match suites.iter_mut().find(|(cat, _)| *cat == c.category) {
            Some((_, members)) => members.push(c),
            None => suites.push((c.category.as_str(), vec![c])),
        }
    }

    let counts = &receipt.verdict.counts;
    out.push_str(&format!(
        "<testsuites name=\"meshlint\" tests=\"{}\" failures=\"{}\" errors=\"{}\">\n",
        receipt.checks.len(),
        counts.failed,
        counts.errored
    ));

    for (category, checks) in &suites {
        let failures = checks.iter().filter(|c| c.status == CheckStatus::Fail).count();
        let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
        out.push_str(&format!(
            "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\">\n",
            escape_xml(category),
            checks.len(),
            failures,
            errors
        ));
        for c in checks {
            out.push_str(&render_testcase(c));
        }
        out.push_str("  </testsuite>\n");
    }

    if receipt.checks.is_empty() {
        out.push_str("  <testsuite name=\"meshlint\" tests=\"1\" failures=\"0\" errors=\"0\">\n");
        out.push_str("    <testcase classname=\"meshlint\" name=\"no_checks_selected\">\n");
        out.push_str("    </testcase>\n");
        out.push_str("  </testsuite>\n");
    }

    out.push_str("</testsuites>\n");
    out
}

fn render_testcase(c: &CheckOutcome) -> String {
    let mut out = format!(
        "    <testcase classname=\"meshlint.{}\" name=\"{}\">\n",
        escape_xml(&c.category),
        escape_xml(&c.name)
    );
    match c.status {
        CheckStatus::Pass => {}
        CheckStatus::Fail => {
            out.push_str(&format!(
                "      <failure type=\"{}\" message=\"{} offending {}(s)\">\n",
                c.entity_kind.as_str(),
                c.count,
                c.entity_kind.as_str()
            ));
            for item in &c.items {
                out.push_str(&escape_xml(item));
                out.push('\n');
            }
            out.push_str("      </failure>\n");
        }
        CheckStatus::Error => {
            out.push_str(&format!(
                "      <error message=\"{}\">\n      </error>\n",
                escape_xml(c.error.as_deref().unwrap_or("check failed"))
            ));
        }
    }
    out.push_str("    </testcase>\n");
    out
}

/// Escapes special XML characters in a string.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlint_types::{
        Backend, EntityKind, RUN_SCHEMA_V1, SceneMeta, ToolMeta, Verdict, VerdictCounts,
        VerdictStatus,
    };

    fn outcome(name: &str, category: &str, status: CheckStatus, items: &[&str]) -> CheckOutcome {
        CheckOutcome {
            name: name.to_string(),
            label: name.to_string(),
            category: category.to_string(),
            entity_kind: EntityKind::Node,
            status,
            count: items.len() as u32,
            items: items.iter().map(|s| s.to_string()).collect(),
            error: None,
        }
    }

    fn receipt(checks: Vec<CheckOutcome>, counts: VerdictCounts) -> RunReceipt {
        RunReceipt {
            schema: RUN_SCHEMA_V1.to_string(),
            tool: ToolMeta {
                name: "meshlint".to_string(),
                version: "0.1.0".to_string(),
            },
            started_at: None,
            scene: SceneMeta {
                source: "scene.json".to_string(),
                digest: None,
                backend: Backend::Native,
                entities_considered: 2,
            },
            checks,
            verdict: Verdict {
                status: VerdictStatus::Fail,
                counts,
                reasons: vec![],
            },
            timing: None,
        }
    }

    #[test]
    fn snapshot_junit_one_suite_per_category() {
        let mut broken = outcome("default_names", "Naming", CheckStatus::Error, &[]);
        broken.error = Some("failed: invalid pattern '<'".to_string());
        let r = receipt(
            vec![
                outcome("history", "General", CheckStatus::Fail, &["|a&b"]),
                outcome("layers", "General", CheckStatus::Pass, &[]),
                broken,
            ],
            VerdictCounts {
                passed: 1,
                failed: 1,
                errored: 1,
            },
        );
        let xml = render_junit_for_receipt(&r);
        insta::assert_snapshot!(xml, @r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <testsuites name="meshlint" tests="3" failures="1" errors="1">
          <testsuite name="General" tests="2" failures="1" errors="0">
            <testcase classname="meshlint.General" name="history">
              <failure type="node" message="1 offending node(s)">
        |a&amp;b
              </failure>
            </testcase>
            <testcase classname="meshlint.General" name="layers">
            </testcase>
          </testsuite>
          <testsuite name="Naming" tests="1" failures="0" errors="1">
            <testcase classname="meshlint.Naming" name="default_names">
              <error message="failed: invalid pattern &apos;&lt;&apos;">
              </error>
            </testcase>
          </testsuite>
        </testsuites>
        "#);
    }

    #[test]
    fn empty_receipt_emits_placeholder_suite() {
        let xml = render_junit_for_receipt(&receipt(vec![], VerdictCounts::default()));
        assert!(xml.contains("name=\"no_checks_selected\""));
        assert!(xml.contains("tests=\"0\""));
    }

    #[test]
    fn escape_xml_handles_special_chars() {
        assert_eq!(escape_xml("a<b>\"c\"&'d'"), "a&lt;b&gt;&quot;c&quot;&amp;&apos;d&apos;");
    }
}
