use crate::error::PayloadError;
use serde_json::Value;

pub const EMPTY_PLATFORMS_LABEL: &str = "None";

/// What the platforms panel should show. Built fresh from each event and
/// rendered as a full replacement of the previous plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlatformRenderPlan {
    Badges(Vec<String>),
    #[default]
    Empty,
}

impl PlatformRenderPlan {
    pub fn badges(&self) -> &[String] {
        match self {
            PlatformRenderPlan::Badges(badges) => badges,
            PlatformRenderPlan::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PlatformRenderPlan::Empty)
    }
}

/// Normalizes the `active_platform` field.
///
/// Arrays are the primary form, a single non-blank string is accepted for
/// older backends, and anything else (absent, blank, empty array) yields
/// [`PlatformRenderPlan::Empty`].
pub fn render_platforms(active_platform: Option<&Value>) -> PlatformRenderPlan {
    let badges = match active_platform {
        Some(Value::Array(items)) => items.iter().filter_map(badge_text).collect::<Vec<_>>(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => Vec::new(),
    };
    if badges.is_empty() {
        PlatformRenderPlan::Empty
    } else {
        PlatformRenderPlan::Badges(badges)
    }
}

fn badge_text(item: &Value) -> Option<String> {
    match item {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

pub fn parse_active_platforms(data: &str) -> Result<PlatformRenderPlan, PayloadError> {
    let value: Value = serde_json::from_str(data)?;
    let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
    Ok(render_platforms(object.get("active_platform")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_renders_one_badge_per_entry_in_order() {
        let plan = render_platforms(Some(&json!(["a", "b"])));
        assert_eq!(
            plan,
            PlatformRenderPlan::Badges(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn single_string_renders_one_badge() {
        let plan = parse_active_platforms(r#"{"active_platform": "c"}"#).expect("parse");
        assert_eq!(plan.badges(), ["c".to_string()]);
    }

    #[test]
    fn empty_or_absent_renders_empty_state() {
        assert!(parse_active_platforms(r#"{"active_platform": []}"#)
            .expect("parse")
            .is_empty());
        assert!(parse_active_platforms(r#"{}"#).expect("parse").is_empty());
        assert!(parse_active_platforms(r#"{"active_platform": "  "}"#)
            .expect("parse")
            .is_empty());
        assert!(parse_active_platforms(r#"{"active_platform": null}"#)
            .expect("parse")
            .is_empty());
        assert!(render_platforms(Some(&json!({"x": 1}))).is_empty());
    }

    #[test]
    fn non_string_entries_use_json_text() {
        let plan = render_platforms(Some(&json!(["Twitter", null, 7])));
        assert_eq!(plan.badges(), ["Twitter".to_string(), "7".to_string()]);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_active_platforms("{").is_err());
        assert_eq!(
            parse_active_platforms(r#"["a"]"#),
            Err(PayloadError::NotAnObject)
        );
    }
}
