use crate::error::OrmError;
use std::fmt;
use std::str::FromStr;

/// Lifecycle event a record fires during construction, loading, population, replication,
/// validation, storage and deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    PostConstruct,
    PreDelete,
    PostBeginDelete,
    PreCommitDelete,
    PostCommitDelete,
    PostRollbackDelete,
    PostDelete,
    PostLoadFromIdentityMap,
    PostLoadFromResult,
    PrePopulate,
    PostPopulate,
    PreReplicate,
    PostReplicate,
    ClonedReplicate,
    PreStore,
    PostBeginStore,
    PostValidateStore,
    PreCommitStore,
    PostCommitStore,
    PostRollbackStore,
    PostStore,
    PreValidate,
    PostValidate,
}

impl Hook {
    pub const ALL: [Hook; 23] = [
        Hook::PostConstruct,
        Hook::PreDelete,
        Hook::PostBeginDelete,
        Hook::PreCommitDelete,
        Hook::PostCommitDelete,
        Hook::PostRollbackDelete,
        Hook::PostDelete,
        Hook::PostLoadFromIdentityMap,
        Hook::PostLoadFromResult,
        Hook::PrePopulate,
        Hook::PostPopulate,
        Hook::PreReplicate,
        Hook::PostReplicate,
        Hook::ClonedReplicate,
        Hook::PreStore,
        Hook::PostBeginStore,
        Hook::PostValidateStore,
        Hook::PreCommitStore,
        Hook::PostCommitStore,
        Hook::PostRollbackStore,
        Hook::PostStore,
        Hook::PreValidate,
        Hook::PostValidate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::PostConstruct => "post::__construct()",
            Hook::PreDelete => "pre::delete()",
            Hook::PostBeginDelete => "post-begin::delete()",
            Hook::PreCommitDelete => "pre-commit::delete()",
            Hook::PostCommitDelete => "post-commit::delete()",
            Hook::PostRollbackDelete => "post-rollback::delete()",
            Hook::PostDelete => "post::delete()",
            Hook::PostLoadFromIdentityMap => "post::loadFromIdentityMap()",
            Hook::PostLoadFromResult => "post::loadFromResult()",
            Hook::PrePopulate => "pre::populate()",
            Hook::PostPopulate => "post::populate()",
            Hook::PreReplicate => "pre::replicate()",
            Hook::PostReplicate => "post::replicate()",
            Hook::ClonedReplicate => "cloned::replicate()",
            Hook::PreStore => "pre::store()",
            Hook::PostBeginStore => "post-begin::store()",
            Hook::PostValidateStore => "post-validate::store()",
            Hook::PreCommitStore => "pre-commit::store()",
            Hook::PostCommitStore => "post-commit::store()",
            Hook::PostRollbackStore => "post-rollback::store()",
            Hook::PostStore => "post::store()",
            Hook::PreValidate => "pre::validate()",
            Hook::PostValidate => "post::validate()",
        }
    }
}

impl FromStr for Hook {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .iter()
            .copied()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| OrmError::InvalidHook {
                hook: s.to_string(),
                valid: Hook::ALL.map(|h| h.as_str()).join(", "),
            })
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_hook_parses_from_its_name() {
        for hook in Hook::ALL {
            assert_eq!(hook.as_str().parse::<Hook>().unwrap(), hook);
        }
    }

    #[test]
    fn test_unknown_hook_lists_valid_names() {
        let err = "post::save()".parse::<Hook>().unwrap_err();
        assert_eq!(err.code(), "invalid_hook");
        let msg = err.to_string();
        assert!(msg.contains("post::save()"));
        assert!(msg.contains("post::__construct()"));
        assert!(msg.contains("post-rollback::store()"));
        assert!(msg.contains("post::validate()"));
    }
}
