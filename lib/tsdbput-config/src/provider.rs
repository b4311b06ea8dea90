use std::path::Path;

use figment::{
    providers::{Format, Json, Yaml},
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};

/// A provider whose data has been read and parsed up front.
///
/// `figment` file providers read lazily, and quietly treat a missing file as empty. Reading eagerly lets the loader
/// surface unreadable or malformed files at the point they're added.
pub struct ResolvedProvider {
    data: Map<Profile, Dict>,
    metadata: Metadata,
}

impl ResolvedProvider {
    pub fn from_yaml<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::from_file::<Yaml>(path.as_ref(), "YAML file")
    }

    pub fn from_json<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::from_file::<Json>(path.as_ref(), "JSON file")
    }

    fn from_file<F: Format>(path: &Path, kind: &'static str) -> Result<Self, Error> {
        let file_data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let data = F::string(&file_data).data()?;

        Ok(Self {
            data,
            metadata: Metadata::from(kind, path),
        })
    }
}

impl Provider for ResolvedProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Ok(self.data.clone())
    }
}
