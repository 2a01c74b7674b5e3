use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MgError;

macro_rules! opaque_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = MgError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(MgError::InvalidIdentifier {
                        kind: $kind,
                        value: value.to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

opaque_id!(ProjectId, "project");
opaque_id!(MetagenomeId, "metagenome");

/// What the user asked for: a whole project or a single metagenome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Project(ProjectId),
    Metagenome(MetagenomeId),
}

impl Identifier {
    /// Project wins when both are supplied.
    pub fn from_options(
        project: Option<&str>,
        metagenome: Option<&str>,
    ) -> Result<Self, MgError> {
        match (project, metagenome) {
            (Some(project), _) => Ok(Identifier::Project(project.parse()?)),
            (None, Some(metagenome)) => Ok(Identifier::Metagenome(metagenome.parse()?)),
            (None, None) => Err(MgError::MissingIdentifier),
        }
    }

    pub fn project(&self) -> Option<&ProjectId> {
        match self {
            Identifier::Project(id) => Some(id),
            Identifier::Metagenome(_) => None,
        }
    }
}

const SUBSET_DATA_TYPES: [&str; 2] = ["passed", "removed"];
const UPLOAD_STAGE: &str = "upload";

/// One downloadable file as described by the catalog's download listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub file_id: String,
    pub file_name: String,
    pub file_format: String,
    pub stage_id: String,
    pub stage_name: String,
    pub data_type: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub file_md5: String,
    pub url: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl FileDescriptor {
    /// Local filename for this file.
    ///
    /// Subset files ("passed"/"removed") are always nucleotide FASTA and are
    /// named after their stage. Upload-stage files keep their declared format.
    /// Everything else uses the server-supplied name.
    pub fn local_name(&self) -> String {
        if SUBSET_DATA_TYPES.contains(&self.data_type.as_str()) {
            format!("{}.{}.fna", self.stage_id, self.stage_name)
        } else if self.stage_name == UPLOAD_STAGE {
            format!("{}.{}.{}", self.stage_id, self.stage_name, self.file_format)
        } else {
            self.file_name.clone()
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.file_size.unwrap_or(0)
    }
}
