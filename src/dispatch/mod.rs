//! Listener registration and event dispatch.
//!
//! Registrations name event types and logical ids as whitespace-separated
//! strings (or lists of them); both are expanded into their cross product and
//! every pair becomes one listener sharing the same callback.

pub mod event;
pub mod registry;

pub use event::{DeviceEvent, EventType, InputEvent, ListenerOptions};
pub use registry::{
    Callback, DispatchOutcome, Listener, ListenerId, ListenerRegistry, ListenerResult,
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("'{0}' is a device event, register it with on_device")]
    LifecycleInListener(EventType),

    #[error("Registration names no {0}")]
    Empty(&'static str),
}

/// What to register: button/axis listeners, or a device lifecycle handler
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Listener {
        types: Vec<String>,
        ids: Vec<String>,
        options: ListenerOptions,
    },
    Lifecycle(DeviceEvent),
}

impl Registration {
    pub fn listener(types: &str, ids: &str, options: ListenerOptions) -> Self {
        Registration::Listener {
            types: vec![types.to_string()],
            ids: vec![ids.to_string()],
            options,
        }
    }

    pub fn listener_list<T, I>(types: T, ids: I, options: ListenerOptions) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Registration::Listener {
            types: types.into_iter().map(Into::into).collect(),
            ids: ids.into_iter().map(Into::into).collect(),
            options,
        }
    }
}

/// Expands compound type/id lists into every (type, id) pair.
///
/// Each entry may itself hold several whitespace-separated names. Duplicate
/// pairs are kept once.
pub fn expand<S: AsRef<str>>(
    types: &[S],
    ids: &[S],
) -> Result<Vec<(EventType, String)>, RegistrationError> {
    let mut parsed_types: Vec<EventType> = Vec::new();
    for name in types.iter().flat_map(|t| t.as_ref().split_whitespace()) {
        let kind: EventType = name.parse()?;
        if kind.is_lifecycle() {
            return Err(RegistrationError::LifecycleInListener(kind));
        }
        if !parsed_types.contains(&kind) {
            parsed_types.push(kind);
        }
    }

    let mut parsed_ids: Vec<&str> = Vec::new();
    for id in ids.iter().flat_map(|i| i.as_ref().split_whitespace()) {
        if !parsed_ids.contains(&id) {
            parsed_ids.push(id);
        }
    }

    if parsed_types.is_empty() {
        return Err(RegistrationError::Empty("event type"));
    }
    if parsed_ids.is_empty() {
        return Err(RegistrationError::Empty("logical id"));
    }

    Ok(parsed_types
        .iter()
        .flat_map(|&kind| parsed_ids.iter().map(move |id| (kind, id.to_string())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cross_product() {
        let pairs = expand(&["press release"], &["button_1 button_2"]).unwrap();
        assert_eq!(
            pairs,
            vec![
                (EventType::Press, "button_1".to_string()),
                (EventType::Press, "button_2".to_string()),
                (EventType::Release, "button_1".to_string()),
                (EventType::Release, "button_2".to_string()),
            ]
        );
    }

    #[test]
    fn test_expand_lists_and_extra_whitespace() {
        let pairs = expand(&["hold", "  press "], &["start", "d_pad_up\tselect"]).unwrap();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[0], (EventType::Hold, "start".to_string()));
        assert_eq!(pairs[5], (EventType::Press, "select".to_string()));
    }

    #[test]
    fn test_expand_deduplicates() {
        let pairs = expand(&["press press"], &["start start"]).unwrap();
        assert_eq!(pairs, vec![(EventType::Press, "start".to_string())]);
    }

    #[test]
    fn test_expand_rejects_unknown_and_lifecycle() {
        assert_eq!(
            expand(&["tap"], &["start"]),
            Err(RegistrationError::UnknownEventType("tap".to_string()))
        );
        assert_eq!(
            expand(&["press connect"], &["start"]),
            Err(RegistrationError::LifecycleInListener(EventType::Connect))
        );
    }

    #[test]
    fn test_expand_rejects_empty() {
        assert_eq!(
            expand(&["   "], &["start"]),
            Err(RegistrationError::Empty("event type"))
        );
        assert_eq!(
            expand(&["press"], &[""]),
            Err(RegistrationError::Empty("logical id"))
        );
    }
}
