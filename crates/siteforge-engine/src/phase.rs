use std::fmt;

/// Steps of a manifest run. Provisioning and deprovisioning each walk a fixed slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    AddFeatures,
    RemoveFeatures,
    ProvisionGroups,
    ProvisionRoleDefinitions,
    ProvisionFields,
    ProvisionContentTypes,
    ProvisionLists,
    ProvisionFiles,
    ProvisionNavigation,
    ProvisionClassicWorkflows,
    ProvisionCustomActions,
    AttachEvents,
    ApplyDocumentTemplates,
    ProvisionLookAndFeel,
    DeleteCustomActions,
    DeleteFiles,
    DetachEvents,
    DeleteLists,
    DeleteContentTypes,
    DeleteFields,
    ApplySettings,
}

/// Fields before content types before lists before anything that fills
/// lists. Navigation and workflows precede custom actions because both may
/// queue extra custom actions.
pub const PROVISION_PHASES: [Phase; 14] = [
    Phase::AddFeatures,
    Phase::RemoveFeatures,
    Phase::ProvisionGroups,
    Phase::ProvisionRoleDefinitions,
    Phase::ProvisionFields,
    Phase::ProvisionContentTypes,
    Phase::ProvisionLists,
    Phase::ProvisionFiles,
    Phase::ProvisionNavigation,
    Phase::ProvisionClassicWorkflows,
    Phase::ProvisionCustomActions,
    Phase::AttachEvents,
    Phase::ApplyDocumentTemplates,
    Phase::ProvisionLookAndFeel,
];

/// Referencing artifacts go before the artifacts they reference. Features,
/// groups, role definitions, navigation and look-and-feel stay in place.
pub const DEPROVISION_PHASES: [Phase; 6] = [
    Phase::DeleteCustomActions,
    Phase::DeleteFiles,
    Phase::DetachEvents,
    Phase::DeleteLists,
    Phase::DeleteContentTypes,
    Phase::DeleteFields,
];

impl Phase {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddFeatures => "AddFeatures",
            Self::RemoveFeatures => "RemoveFeatures",
            Self::ProvisionGroups => "ProvisionGroups",
            Self::ProvisionRoleDefinitions => "ProvisionRoleDefinitions",
            Self::ProvisionFields => "ProvisionFields",
            Self::ProvisionContentTypes => "ProvisionContentTypes",
            Self::ProvisionLists => "ProvisionLists",
            Self::ProvisionFiles => "ProvisionFiles",
            Self::ProvisionNavigation => "ProvisionNavigation",
            Self::ProvisionClassicWorkflows => "ProvisionClassicWorkflows",
            Self::ProvisionCustomActions => "ProvisionCustomActions",
            Self::AttachEvents => "AttachEvents",
            Self::ApplyDocumentTemplates => "ApplyDocumentTemplates",
            Self::ProvisionLookAndFeel => "ProvisionLookAndFeel",
            Self::DeleteCustomActions => "DeleteCustomActions",
            Self::DeleteFiles => "DeleteFiles",
            Self::DetachEvents => "DetachEvents",
            Self::DeleteLists => "DeleteLists",
            Self::DeleteContentTypes => "DeleteContentTypes",
            Self::DeleteFields => "DeleteFields",
            Self::ApplySettings => "ApplySettings",
        }
    }

    /// Phases that only make sense on a host web.
    #[must_use]
    pub const fn is_host_only(self) -> bool {
        matches!(
            self,
            Self::AddFeatures
                | Self::RemoveFeatures
                | Self::ProvisionGroups
                | Self::ProvisionRoleDefinitions
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::{PROVISION_PHASES, Phase};

    fn position(phase: Phase) -> usize {
        PROVISION_PHASES
            .iter()
            .position(|candidate| *candidate == phase)
            .unwrap_or(usize::MAX)
    }

    #[test]
    fn dependency_order_is_respected() {
        assert!(position(Phase::ProvisionFields) < position(Phase::ProvisionContentTypes));
        assert!(position(Phase::ProvisionContentTypes) < position(Phase::ProvisionLists));
        assert!(position(Phase::ProvisionLists) < position(Phase::ProvisionFiles));
        assert!(position(Phase::ProvisionFiles) < position(Phase::ApplyDocumentTemplates));
        assert!(position(Phase::ProvisionNavigation) < position(Phase::ProvisionCustomActions));
        assert!(
            position(Phase::ProvisionClassicWorkflows) < position(Phase::ProvisionCustomActions)
        );
    }

    #[test]
    fn only_leading_phases_are_host_only() {
        let host_only: Vec<_> = PROVISION_PHASES
            .iter()
            .filter(|phase| phase.is_host_only())
            .collect();
        assert_eq!(host_only.len(), 4);
        assert!(PROVISION_PHASES[..4].iter().all(|phase| phase.is_host_only()));
    }
}
