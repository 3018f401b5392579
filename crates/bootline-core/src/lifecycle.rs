//! Boot lifecycle.
//!
//! One boot walks [`BOOT_SEQUENCE`] in order. Each step either loads a batch
//! of integrations or invokes a lifecycle target. Plural targets run their
//! actions in parallel, singular ones serially.

use std::fmt;

use bootline_protocols::{targets, InvocationMode};

use crate::integration::IntegrationKind;

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

/// Boot phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootPhase {
    /// Context created, nothing loaded.
    Created = 0,
    LoadingServices = 1,
    Starting = 2,
    Settings = 3,
    LoadingFeatures = 4,
    InitServices = 5,
    InitService = 6,
    InitFeatures = 7,
    InitFeature = 8,
    StartServices = 9,
    StartService = 10,
    StartFeatures = 11,
    StartFeature = 12,
    Finishing = 13,
    /// Every step completed.
    Finished = 14,
    /// A step failed; the boot was halted.
    Failed = 15,
}

impl BootPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::LoadingServices => "loading services",
            Self::Starting => "start",
            Self::Settings => "settings",
            Self::LoadingFeatures => "loading features",
            Self::InitServices => "init services",
            Self::InitService => "init service",
            Self::InitFeatures => "init features",
            Self::InitFeature => "init feature",
            Self::StartServices => "start services",
            Self::StartService => "start service",
            Self::StartFeatures => "start features",
            Self::StartFeature => "start feature",
            Self::Finishing => "finish",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    /// Whether the boot is over, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl From<u8> for BootPhase {
    fn from(v: u8) -> Self {
        match v {
            0 => BootPhase::Created,
            1 => BootPhase::LoadingServices,
            2 => BootPhase::Starting,
            3 => BootPhase::Settings,
            4 => BootPhase::LoadingFeatures,
            5 => BootPhase::InitServices,
            6 => BootPhase::InitService,
            7 => BootPhase::InitFeatures,
            8 => BootPhase::InitFeature,
            9 => BootPhase::StartServices,
            10 => BootPhase::StartService,
            11 => BootPhase::StartFeatures,
            12 => BootPhase::StartFeature,
            13 => BootPhase::Finishing,
            14 => BootPhase::Finished,
            15 => BootPhase::Failed,
            _ => BootPhase::Created,
        }
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the boot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run and commit a batch of integrations.
    Load(IntegrationKind),
    /// Invoke a lifecycle target with a null payload.
    Invoke(&'static str, InvocationMode),
}

/// The fixed boot sequence.
pub const BOOT_SEQUENCE: &[(BootPhase, Step)] = &[
    (BootPhase::LoadingServices, Step::Load(IntegrationKind::Service)),
    (BootPhase::Starting, Step::Invoke(targets::START, InvocationMode::Serial)),
    (BootPhase::Settings, Step::Invoke(targets::SETTINGS, InvocationMode::Serial)),
    (BootPhase::LoadingFeatures, Step::Load(IntegrationKind::Feature)),
    (BootPhase::InitServices, Step::Invoke(targets::INIT_SERVICES, InvocationMode::Parallel)),
    (BootPhase::InitService, Step::Invoke(targets::INIT_SERVICE, InvocationMode::Serial)),
    (BootPhase::InitFeatures, Step::Invoke(targets::INIT_FEATURES, InvocationMode::Parallel)),
    (BootPhase::InitFeature, Step::Invoke(targets::INIT_FEATURE, InvocationMode::Serial)),
    (BootPhase::StartServices, Step::Invoke(targets::START_SERVICES, InvocationMode::Parallel)),
    (BootPhase::StartService, Step::Invoke(targets::START_SERVICE, InvocationMode::Serial)),
    (BootPhase::StartFeatures, Step::Invoke(targets::START_FEATURES, InvocationMode::Parallel)),
    (BootPhase::StartFeature, Step::Invoke(targets::START_FEATURE, InvocationMode::Serial)),
    (BootPhase::Finishing, Step::Invoke(targets::FINISH, InvocationMode::Serial)),
];
