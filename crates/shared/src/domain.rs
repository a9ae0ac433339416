use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownSampleType;

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

name_newtype!(TableName);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// A table as reported by the backend schema endpoint. Columns keep the
/// backend's ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: TableName,
    pub row_count: u64,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFileKind {
    Csv,
    Json,
    Jsonl,
}

impl DataFileKind {
    pub const ALL: [DataFileKind; 3] = [DataFileKind::Csv, DataFileKind::Json, DataFileKind::Jsonl];

    pub fn extension(self) -> &'static str {
        match self {
            DataFileKind::Csv => ".csv",
            DataFileKind::Json => ".json",
            DataFileKind::Jsonl => ".jsonl",
        }
    }

    /// Classifies a file by its name, ignoring case. Only the suffix matters,
    /// so `.csv` on its own is still a CSV file.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| lower.ends_with(kind.extension()))
    }
}

/// A file handle ready to be sent to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn kind(&self) -> Option<DataFileKind> {
        DataFileKind::from_file_name(&self.file_name)
    }
}

/// Bundled datasets offered by the upload dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDataset {
    Users,
    Products,
    Events,
}

impl SampleDataset {
    pub fn file_name(self) -> &'static str {
        match self {
            SampleDataset::Users => "users.json",
            SampleDataset::Products => "products.csv",
            SampleDataset::Events => "events.jsonl",
        }
    }
}

impl FromStr for SampleDataset {
    type Err = UnknownSampleType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "users" => Ok(SampleDataset::Users),
            "products" => Ok(SampleDataset::Products),
            "events" => Ok(SampleDataset::Events),
            other => Err(UnknownSampleType(other.to_string())),
        }
    }
}
