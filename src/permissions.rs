//! Role based access rules attached to each build service

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Authorization {
    Read,
    Write,
    Execute,
    Create,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionsError {
    #[error("unknown authorization `{0}`, expected one of READ, WRITE, EXECUTE, CREATE")]
    UnknownAuthorization(CompactString),
}

impl Authorization {
    pub const ALL: [Authorization; 4] =
        [Authorization::Read, Authorization::Write, Authorization::Execute, Authorization::Create];

    pub fn as_str(&self) -> &'static str {
        match self {
            Authorization::Read => "READ",
            Authorization::Write => "WRITE",
            Authorization::Execute => "EXECUTE",
            Authorization::Create => "CREATE",
        }
    }
}

impl FromStr for Authorization {
    type Err = PermissionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Authorization::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PermissionsError::UnknownAuthorization(s.into()))
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type RawPermissions = BTreeMap<CompactString, Vec<CompactString>>;

/// Permissions as written in configuration, e.g. `READ = ["dev", "ops"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPermissions", into = "RawPermissions")]
pub struct PermissionsBuilder {
    roles: BTreeMap<Authorization, Vec<CompactString>>,
}

impl PermissionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `authorization` to `roles`, appending to any roles already granted
    pub fn add<I, R>(mut self, authorization: Authorization, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<CompactString>,
    {
        self.roles
            .entry(authorization)
            .or_default()
            .extend(roles.into_iter().map(Into::into));
        self
    }

    /// Normalize into immutable permissions: roles are trimmed, lowercased and
    /// de-duplicated; blank roles are dropped.
    pub fn build(&self) -> Permissions {
        let roles = self
            .roles
            .iter()
            .map(|(authorization, roles)| {
                let roles: BTreeSet<CompactString> = roles
                    .iter()
                    .map(|r| normalize(r))
                    .filter(|r| !r.is_empty())
                    .collect();
                (*authorization, roles)
            })
            .filter(|(_, roles)| !roles.is_empty())
            .collect();

        Permissions { roles }
    }
}

impl TryFrom<RawPermissions> for PermissionsBuilder {
    type Error = PermissionsError;

    fn try_from(raw: RawPermissions) -> Result<Self, Self::Error> {
        raw.into_iter().try_fold(
            PermissionsBuilder::new(),
            |builder, (key, roles)| -> Result<_, PermissionsError> {
                Ok(builder.add(key.parse()?, roles))
            },
        )
    }
}

impl From<PermissionsBuilder> for RawPermissions {
    fn from(builder: PermissionsBuilder) -> Self {
        builder
            .roles
            .into_iter()
            .map(|(authorization, roles)| (authorization.as_str().into(), roles))
            .collect()
    }
}

/// Resolved access rules of a build service.
///
/// Services without any role configured are unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    roles: BTreeMap<Authorization, BTreeSet<CompactString>>,
}

impl Permissions {
    pub fn is_restricted(&self) -> bool {
        !self.roles.is_empty()
    }

    pub fn roles_for(&self, authorization: Authorization) -> impl Iterator<Item = &str> {
        self.roles
            .get(&authorization)
            .into_iter()
            .flat_map(|roles| roles.iter().map(CompactString::as_str))
    }

    pub fn is_authorized<R: AsRef<str>>(
        &self,
        user_roles: &[R],
        authorization: Authorization,
    ) -> bool {
        if !self.is_restricted() {
            return true;
        }

        self.roles.get(&authorization).is_some_and(|granted| {
            user_roles
                .iter()
                .any(|role| granted.contains(normalize(role.as_ref()).as_str()))
        })
    }
}

fn normalize(role: &str) -> CompactString {
    role.trim().to_lowercase().into()
}
