use rulegraph_core::{Group, GroupCatalog, Rule};

pub const GROUP_NAMES: [&str; 5] = ["base", "allowance", "bonus", "deduction", "total"];

/// Catalog covering every group `generate_rules` assigns.
pub fn synthetic_catalog() -> GroupCatalog {
    GroupCatalog::new(
        GROUP_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Group::new(*name, name.to_uppercase(), "blue", i as i64 + 1))
            .collect(),
    )
}

/// `rule_count` rules spread across the groups, each referencing up to
/// `fan_in` earlier rules. Every seventh rule also carries a quoted literal
/// and a function call so the scanner has something to skip.
pub fn generate_rules(rule_count: usize, fan_in: usize) -> Vec<Rule> {
    (0..rule_count)
        .map(|i| {
            let group = GROUP_NAMES[i * GROUP_NAMES.len() / rule_count.max(1)];
            let refs: Vec<String> = (1..=fan_in)
                .filter_map(|k| i.checked_sub(k * 3))
                .map(rule_name)
                .collect();
            let mut expression = if refs.is_empty() {
                format!("{i}")
            } else {
                refs.join(" + ")
            };
            if i % 7 == 0 {
                expression = format!("MAX({expression}, 0) + IF(\"Code Word\", 1, 0)");
            }
            let mut rule = Rule::new(rule_name(i), expression).with_group(group);
            if i % 11 == 0 && i > 0 {
                rule = rule.with_depends_on([rule_name(i - 1)]);
            }
            rule
        })
        .collect()
}

pub fn rule_name(index: usize) -> String {
    format!("Component{index}")
}
