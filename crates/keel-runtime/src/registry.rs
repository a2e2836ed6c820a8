//! Resource subtype registration and capability maps.
//!
//! Extensions register their resource subtypes in a process-wide table at
//! startup. The bootstrap reads the table on every request and derives:
//!
//! - `menu_map`: class → label, for subtypes shown in the create menu
//! - `drop_map`: class → drop policy, for subtypes whose policy applies
//!
//! Both maps keep registration order. Descriptors are plain data, so no
//! instance of a subtype is ever created to read them.

use keel_types::ErrorCode;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

/// Class identifier of the abstract base resource type.
pub const BASE_RESOURCE_CLASS: &str = "Resource";

/// Drop policy code of a resource subtype.
///
/// `-1` means dropping does not apply; any other value is surfaced as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropPolicy(i32);

impl DropPolicy {
    /// Dropping does not apply to this subtype.
    pub const NOT_APPLICABLE: Self = Self(-1);

    /// Wraps a raw policy code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Returns `false` for the `-1` sentinel.
    #[must_use]
    pub const fn is_applicable(self) -> bool {
        self.0 != Self::NOT_APPLICABLE.0
    }
}

impl Default for DropPolicy {
    fn default() -> Self {
        Self::NOT_APPLICABLE
    }
}

/// Declared capability flags of one resource subtype.
///
/// ```
/// use keel_runtime::registry::{DropPolicy, ResourceTypeDescriptor};
///
/// let post = ResourceTypeDescriptor::new("BlogPost")
///     .in_menu("Blog Post")
///     .with_drop_policy(DropPolicy::new(2));
/// assert!(post.menu_visible());
/// assert_eq!(post.menu_label(), Some("Blog Post"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTypeDescriptor {
    class: String,
    #[serde(default)]
    menu_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    menu_label: Option<String>,
    #[serde(default)]
    drop_policy: DropPolicy,
}

impl ResourceTypeDescriptor {
    /// Creates a descriptor that is hidden from the menu and not droppable.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            menu_visible: false,
            menu_label: None,
            drop_policy: DropPolicy::NOT_APPLICABLE,
        }
    }

    /// Shows the subtype in the create menu under `label`.
    #[must_use]
    pub fn in_menu(mut self, label: impl Into<String>) -> Self {
        self.menu_visible = true;
        self.menu_label = Some(label.into());
        self
    }

    /// Sets the drop policy.
    #[must_use]
    pub fn with_drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Class identifier.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Whether the subtype appears in the create menu.
    #[must_use]
    pub fn menu_visible(&self) -> bool {
        self.menu_visible
    }

    /// Menu label; only meaningful when [`menu_visible`](Self::menu_visible).
    #[must_use]
    pub fn menu_label(&self) -> Option<&str> {
        if self.menu_visible {
            self.menu_label.as_deref()
        } else {
            None
        }
    }

    /// Drop policy.
    #[must_use]
    pub fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }
}

/// Registration failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A subtype with the same class is already registered.
    #[error("resource type '{0}' is already registered")]
    Duplicate(String),

    /// The abstract base type cannot be registered as a subtype.
    #[error("'{0}' is the base resource type and cannot be registered")]
    BaseClass(String),
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "REGISTRY_DUPLICATE",
            Self::BaseClass(_) => "REGISTRY_BASE_CLASS",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Capability maps derived from the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceCapabilities {
    /// Class → menu label.
    pub menu_map: Map<String, Value>,
    /// Class → drop policy code.
    pub drop_map: Map<String, Value>,
}

/// Process-wide table of registered resource subtypes.
///
/// ```
/// use keel_runtime::registry::{DropPolicy, ResourceTypeDescriptor, ResourceTypeRegistry};
/// use serde_json::json;
///
/// let registry = ResourceTypeRegistry::new();
/// registry
///     .register(ResourceTypeDescriptor::new("BlogPost").in_menu("Blog Post").with_drop_policy(DropPolicy::new(2)))
///     .unwrap();
/// registry.register(ResourceTypeDescriptor::new("Folder")).unwrap();
///
/// let caps = registry.capabilities();
/// assert_eq!(json!(caps.menu_map), json!({"BlogPost": "Blog Post"}));
/// assert_eq!(json!(caps.drop_map), json!({"BlogPost": 2}));
/// ```
#[derive(Debug, Default)]
pub struct ResourceTypeRegistry {
    entries: RwLock<Vec<ResourceTypeDescriptor>>,
}

impl ResourceTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry extensions register into at startup.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ResourceTypeRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Registers a subtype.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Duplicate`] if the class is already registered,
    /// [`RegistryError::BaseClass`] for the base type itself.
    pub fn register(&self, descriptor: ResourceTypeDescriptor) -> Result<(), RegistryError> {
        if descriptor.class() == BASE_RESOURCE_CLASS {
            return Err(RegistryError::BaseClass(descriptor.class));
        }

        let mut entries = self.entries.write();
        if entries.iter().any(|d| d.class() == descriptor.class()) {
            return Err(RegistryError::Duplicate(descriptor.class));
        }

        debug!(class = %descriptor.class(), "Resource type registered");
        entries.push(descriptor);
        Ok(())
    }

    /// Removes a subtype. Returns `true` if it was registered.
    pub fn unregister(&self, class: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|d| d.class() != class);
        entries.len() < before
    }

    /// Number of registered subtypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of all descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ResourceTypeDescriptor> {
        self.entries.read().clone()
    }

    /// Derives the menu and drop maps from the current table.
    ///
    /// A visible subtype without a label is listed under its class name.
    #[must_use]
    pub fn capabilities(&self) -> ResourceCapabilities {
        let entries = self.entries.read();
        let mut caps = ResourceCapabilities::default();

        for descriptor in entries.iter() {
            if descriptor.menu_visible() {
                let label = descriptor
                    .menu_label()
                    .filter(|l| !l.is_empty())
                    .unwrap_or(descriptor.class());
                caps.menu_map
                    .insert(descriptor.class().to_string(), Value::from(label));
            }

            if descriptor.drop_policy().is_applicable() {
                caps.drop_map.insert(
                    descriptor.class().to_string(),
                    Value::from(descriptor.drop_policy().code()),
                );
            }
        }

        caps
    }
}
