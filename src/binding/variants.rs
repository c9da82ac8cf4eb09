//! Variant-assignment expressions for component instances.
//!
//! Two matching modes against a component family's declared schema:
//!
//! - **Lenient**: `|`- or `,`-separated tokens, case-insensitive property
//!   and value matching, at most one bare token kept as a positional value
//!   for the family's first declared property. Unknown properties are
//!   logged and ignored.
//! - **Strict**: comma-separated `Key=Value` tokens that must match the
//!   declared property order exactly: same count, same key at the same
//!   ordinal, case-sensitive, and every value observed somewhere in the
//!   family. Any mismatch aborts the whole assignment.
//!
//! A resolved assignment only ever names the properties it sets; applying
//! it preserves all other current values on the instance.

use tracing::warn;

use crate::scene::{NodeId, Scene};

/// A parsed lenient expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Explicit (property, value) pairs in input order.
    Pairs(Vec<(String, String)>),
    /// A single bare value for the first declared property.
    ValueOnly(String),
}

/// Parse a lenient expression. Returns `None` when nothing usable remains
/// after trimming (no pairs and no positional value).
pub fn parse_assignments(input: &str) -> Option<Assignment> {
    let mut pairs = Vec::new();
    let mut value_only: Option<String> = None;
    for token in input.split(['|', ',']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((k, v)) => {
                let (k, v) = (k.trim(), v.trim());
                if !k.is_empty() && !v.is_empty() {
                    pairs.push((k.to_string(), v.to_string()));
                }
            }
            None => {
                if value_only.is_none() {
                    value_only = Some(token.to_string());
                }
            }
        }
    }
    if !pairs.is_empty() {
        Some(Assignment::Pairs(pairs))
    } else {
        value_only.map(Assignment::ValueOnly)
    }
}

/// A component family's declared schema plus the values observed across
/// its sibling variants.
#[derive(Debug, Clone)]
pub struct VariantFamily {
    /// Property names in the origin component's declared order.
    declared: Vec<String>,
    /// Canonical property name → values observed across the family,
    /// exact-case, deduplicated, in encounter order.
    allowed: Vec<(String, Vec<String>)>,
}

impl VariantFamily {
    /// Build the family schema for a component: declared order from the
    /// component itself, allowed values unioned across its siblings under
    /// the same component set.
    ///
    /// Returns `None` for a component with no variant properties.
    pub fn from_scene(scene: &Scene, component: NodeId) -> Option<Self> {
        let declared: Vec<String> = scene
            .get(component)
            .as_component()?
            .variant_properties
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        if declared.is_empty() {
            return None;
        }
        let mut allowed: Vec<(String, Vec<String>)> =
            declared.iter().map(|k| (k.clone(), Vec::new())).collect();
        for member in scene.family_members(component) {
            let Some(comp) = scene.get(member).as_component() else {
                continue;
            };
            for (key, value) in &comp.variant_properties {
                let slot = match allowed
                    .iter_mut()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                {
                    Some(slot) => slot,
                    None => {
                        allowed.push((key.clone(), Vec::new()));
                        allowed.last_mut().expect("just pushed")
                    }
                };
                if !slot.1.iter().any(|v| v == value) {
                    slot.1.push(value.clone());
                }
            }
        }
        Some(Self { declared, allowed })
    }

    pub fn declared_properties(&self) -> &[String] {
        &self.declared
    }

    pub fn first_property(&self) -> Option<&str> {
        self.declared.first().map(String::as_str)
    }

    fn canonical_property(&self, name: &str) -> Option<&str> {
        self.allowed
            .iter()
            .map(|(k, _)| k.as_str())
            .find(|k| k.eq_ignore_ascii_case(name))
    }

    fn observed_values(&self, property: &str) -> &[String] {
        self.allowed
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, vs)| vs.as_slice())
            .unwrap_or(&[])
    }

    /// Case-insensitive canonicalization of a value for a property;
    /// values never observed in the family pass through unchanged.
    fn canonical_value(&self, property: &str, value: &str) -> String {
        self.observed_values(property)
            .iter()
            .find(|v| v.eq_ignore_ascii_case(value))
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}

/// Resolve a lenient assignment to the property updates it names.
pub fn resolve_lenient(family: &VariantFamily, assignment: &Assignment) -> Vec<(String, String)> {
    match assignment {
        Assignment::ValueOnly(value) => match family.first_property() {
            Some(first) => vec![(first.to_string(), family.canonical_value(first, value))],
            None => Vec::new(),
        },
        Assignment::Pairs(pairs) => {
            let mut updates = Vec::new();
            for (key, value) in pairs {
                match family.canonical_property(key) {
                    Some(canonical) => {
                        let canonical = canonical.to_string();
                        let value = family.canonical_value(&canonical, value);
                        updates.push((canonical, value));
                    }
                    None => {
                        warn!(property = %key, "ignoring unknown variant property");
                    }
                }
            }
            updates
        }
    }
}

/// Resolve a strict expression, or `None` when any rule fails:
/// token count must equal the declared property count, each key must match
/// the declared name at its ordinal exactly, and each value must have been
/// observed for that property across the family.
pub fn resolve_strict(family: &VariantFamily, raw: &str) -> Option<Vec<(String, String)>> {
    let tokens: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != family.declared.len() {
        return None;
    }
    let mut updates = Vec::with_capacity(tokens.len());
    for (token, expected_key) in tokens.iter().zip(&family.declared) {
        let (key, value) = token.split_once('=')?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() || key != expected_key {
            return None;
        }
        if !family.observed_values(key).iter().any(|v| v == value) {
            return None;
        }
        updates.push((key.to_string(), value.to_string()));
    }
    Some(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn family() -> (Scene, NodeId) {
        let mut scene = Scene::new("Page");
        let set = scene.add_component_set(scene.root, "Button");
        let a = scene.add_component(
            set,
            "Size=Large, Color=Red",
            vec![
                ("Size".into(), "Large".into()),
                ("Color".into(), "Red".into()),
            ],
        );
        scene.add_component(
            set,
            "Size=Small, Color=Blue",
            vec![
                ("Size".into(), "Small".into()),
                ("Color".into(), "Blue".into()),
            ],
        );
        (scene, a)
    }

    #[test]
    fn parse_pairs_and_positional() {
        assert_eq!(
            parse_assignments("Size=Large|Color=Red"),
            Some(Assignment::Pairs(vec![
                ("Size".into(), "Large".into()),
                ("Color".into(), "Red".into()),
            ]))
        );
        assert_eq!(
            parse_assignments("Large"),
            Some(Assignment::ValueOnly("Large".into()))
        );
        // Pairs win over a stray bare token.
        assert_eq!(
            parse_assignments("Large, Color=Red"),
            Some(Assignment::Pairs(vec![("Color".into(), "Red".into())]))
        );
        assert_eq!(parse_assignments("  ,|, "), None);
    }

    #[test]
    fn lenient_is_case_insensitive() {
        let (scene, comp) = family();
        let fam = VariantFamily::from_scene(&scene, comp).unwrap();
        let parsed = parse_assignments("size=large").unwrap();
        assert_eq!(
            resolve_lenient(&fam, &parsed),
            vec![("Size".to_string(), "Large".to_string())]
        );
    }

    #[test]
    fn lenient_positional_targets_first_declared_property() {
        let (scene, comp) = family();
        let fam = VariantFamily::from_scene(&scene, comp).unwrap();
        let parsed = parse_assignments("small").unwrap();
        assert_eq!(
            resolve_lenient(&fam, &parsed),
            vec![("Size".to_string(), "Small".to_string())]
        );
    }

    #[test]
    fn lenient_ignores_unknown_properties() {
        let (scene, comp) = family();
        let fam = VariantFamily::from_scene(&scene, comp).unwrap();
        let parsed = parse_assignments("Shape=Round, Color=Blue").unwrap();
        assert_eq!(
            resolve_lenient(&fam, &parsed),
            vec![("Color".to_string(), "Blue".to_string())]
        );
    }

    #[test]
    fn strict_accepts_exact_order_and_values() {
        let (scene, comp) = family();
        let fam = VariantFamily::from_scene(&scene, comp).unwrap();
        assert_eq!(
            resolve_strict(&fam, "Size=Small, Color=Red"),
            Some(vec![
                ("Size".to_string(), "Small".to_string()),
                ("Color".to_string(), "Red".to_string()),
            ])
        );
    }

    #[test]
    fn strict_rejects_reordering() {
        let (scene, comp) = family();
        let fam = VariantFamily::from_scene(&scene, comp).unwrap();
        assert_eq!(resolve_strict(&fam, "Color=Red,Size=Large"), None);
    }

    #[test]
    fn strict_rejects_count_case_and_unknown_values() {
        let (scene, comp) = family();
        let fam = VariantFamily::from_scene(&scene, comp).unwrap();
        assert_eq!(resolve_strict(&fam, "Size=Large"), None);
        assert_eq!(resolve_strict(&fam, "size=Large, Color=Red"), None);
        assert_eq!(resolve_strict(&fam, "Size=Large, Color=Green"), None);
        assert_eq!(resolve_strict(&fam, "Size=large, Color=Red"), None);
    }
}
