use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct JobId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ProjectId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct PipelineId {
    value: u64,
}

impl ProjectId {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

impl PipelineId {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

impl JobId {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

macro_rules! numeric_id_serde {
    ($($id:ident),*) => {
        $(
            impl<'de> Deserialize<'de> for $id {
                fn deserialize<D>(deserializer: D) -> Result<$id, D::Error>
                    where D: Deserializer<'de>,
                {
                    let id = u64::deserialize(deserializer)?;
                    Ok($id::new(id))
                }
            }

            impl Serialize for $id {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                    where S: Serializer,
                {
                    serializer.serialize_u64(self.value)
                }
            }

            impl std::fmt::Display for $id {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self.value)
                }
            }
        )*
    };
}

numeric_id_serde!(ProjectId, PipelineId, JobId);
