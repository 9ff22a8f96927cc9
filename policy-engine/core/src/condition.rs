use std::fmt;

/// A status condition produced by a single validation or conflict pass.
///
/// Conditions follow Gateway API policy status semantics: the type is always
/// `Accepted` and the outcome is carried by the status and reason.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Condition {
    pub type_: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    pub message: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConditionType {
    Accepted,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConditionReason {
    Accepted,
    Invalid,
    Conflicted,
}

// === impl Condition ===

impl Condition {
    pub fn accepted() -> Self {
        Self {
            type_: ConditionType::Accepted,
            status: ConditionStatus::True,
            reason: ConditionReason::Accepted,
            message: "The Policy is accepted".to_string(),
        }
    }

    pub fn policy_invalid(message: impl Into<String>) -> Self {
        Self {
            type_: ConditionType::Accepted,
            status: ConditionStatus::False,
            reason: ConditionReason::Invalid,
            message: message.into(),
        }
    }

    pub fn policy_conflicted(message: impl Into<String>) -> Self {
        Self {
            type_: ConditionType::Accepted,
            status: ConditionStatus::False,
            reason: ConditionReason::Conflicted,
            message: message.into(),
        }
    }

    pub fn authentication_filter_invalid(message: impl Into<String>) -> Self {
        Self {
            type_: ConditionType::Accepted,
            status: ConditionStatus::False,
            reason: ConditionReason::Invalid,
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} ({}): {}",
            self.type_.as_str(),
            self.status.as_str(),
            self.reason.as_str(),
            self.message
        )
    }
}

// === impl ConditionType ===

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
        }
    }
}

// === impl ConditionStatus ===

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
        }
    }
}

// === impl ConditionReason ===

impl ConditionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Invalid => "Invalid",
            Self::Conflicted => "Conflicted",
        }
    }
}
