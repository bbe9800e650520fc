//! Owning-controller resolution from pod owner references.

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

use spread_index::ControllerKind;

/// Identity of the workload controller that owns a pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerRef {
    pub kind: ControllerKind,
    pub uid: String,
    pub name: String,
}

impl ControllerRef {
    fn from_owner(owner: &OwnerReference) -> Option<Self> {
        if owner.uid.is_empty() || owner.name.is_empty() {
            return None;
        }
        let kind = ControllerKind::from_kind(&owner.kind)?;
        Some(Self {
            kind,
            uid: owner.uid.clone(),
            name: owner.name.clone(),
        })
    }

    /// Kind and uid match. The name is ignored so that renamed controllers
    /// still match their pods.
    pub fn matches(&self, owner: &OwnerReference) -> bool {
        owner.kind == self.kind.as_str() && owner.uid == self.uid
    }
}

fn owner_references(pod: &Pod) -> &[OwnerReference] {
    pod.metadata.owner_references.as_deref().unwrap_or_default()
}

/// First owner reference of a recognized kind with a non-empty uid and name.
///
/// Owners of other kinds are skipped. `None` means the filter does not
/// apply to this pod.
pub fn resolve_controller(pod: &Pod) -> Option<ControllerRef> {
    owner_references(pod)
        .iter()
        .find_map(ControllerRef::from_owner)
}

/// Whether any of the pod's owner references points at `controller`.
pub fn is_owned_by(pod: &Pod, controller: &ControllerRef) -> bool {
    owner_references(pod)
        .iter()
        .any(|owner| controller.matches(owner))
}
