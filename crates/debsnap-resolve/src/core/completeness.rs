use crate::core::Role;

/// Which source roles produced a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSet {
    pub dsc: bool,
    pub orig: bool,
    pub debian: bool,
    pub native: bool,
}

impl RoleSet {
    pub fn contains(&self, role: Role) -> bool {
        match role {
            Role::Dsc => self.dsc,
            Role::Orig => self.orig,
            Role::Debian => self.debian,
            Role::Native => self.native,
            Role::Binary => false,
        }
    }

    fn is_empty(&self) -> bool {
        !(self.dsc || self.orig || self.debian || self.native)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceVerdict {
    /// `dsc`, `orig` and `debian` all present.
    Complete,
    /// `dsc` plus a native tarball, with no trace of an orig/debian split.
    NativeOnly,
    /// Some files found, but no acceptable combination.
    Inconsistent { missing: Vec<Role> },
    /// Nothing found at all.
    Absent,
}

impl SourceVerdict {
    /// Roles that make up the envelope, in reporting order.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            SourceVerdict::Complete => &[Role::Dsc, Role::Orig, Role::Debian],
            SourceVerdict::NativeOnly => &[Role::Dsc, Role::Native],
            SourceVerdict::Inconsistent { .. } | SourceVerdict::Absent => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryVerdict {
    Complete,
    Absent,
}

pub fn assess_source(found: RoleSet) -> SourceVerdict {
    let split = found.orig || found.debian;

    match found {
        _ if found.is_empty() => SourceVerdict::Absent,
        RoleSet {
            dsc: true,
            orig: true,
            debian: true,
            ..
        } => SourceVerdict::Complete,
        RoleSet {
            dsc: true,
            native: true,
            ..
        } if !split => SourceVerdict::NativeOnly,
        _ => {
            let mut missing = Vec::new();
            if !found.dsc {
                missing.push(Role::Dsc);
            }
            if split {
                missing.extend([Role::Orig, Role::Debian].into_iter().filter(|role| !found.contains(*role)));
            } else if !found.native {
                missing.extend([Role::Orig, Role::Debian, Role::Native]);
            }
            SourceVerdict::Inconsistent { missing }
        }
    }
}

pub fn assess_binary(found: impl IntoIterator<Item = bool>) -> BinaryVerdict {
    if found.into_iter().any(|hit| hit) {
        BinaryVerdict::Complete
    } else {
        BinaryVerdict::Absent
    }
}
