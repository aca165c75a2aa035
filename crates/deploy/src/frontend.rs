//! Front-end artifact export.
//!
//! After a deploy the front-end needs two files: the interface description
//! and a map from chain id (as a decimal string) to every lottery address
//! deployed on that chain.

use crate::deploy::Deployment;
use crate::interface::lottery_interface;
use crate::ExportError;
use lottery_types::{Address, ChainId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Address map as stored on disk.
pub type ContractAddresses = BTreeMap<String, Vec<String>>;

/// Writes deployment artifacts for the front-end.
#[derive(Debug, Clone)]
pub struct FrontEndExporter {
    addresses_path: PathBuf,
    abi_path: PathBuf,
}

impl FrontEndExporter {
    pub fn new(addresses_path: impl Into<PathBuf>, abi_path: impl Into<PathBuf>) -> Self {
        Self {
            addresses_path: addresses_path.into(),
            abi_path: abi_path.into(),
        }
    }

    /// Standard layout under a front-end checkout:
    /// `constants/contractAddresses.json` and `constants/abi.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let constants = dir.as_ref().join("constants");
        Self::new(
            constants.join("contractAddresses.json"),
            constants.join("abi.json"),
        )
    }

    pub fn addresses_path(&self) -> &Path {
        &self.addresses_path
    }

    pub fn abi_path(&self) -> &Path {
        &self.abi_path
    }

    /// Write both artifacts for `deployment`.
    pub fn export(&self, deployment: &Deployment) -> Result<(), ExportError> {
        self.write_abi()?;
        let added = self.update_contract_addresses(deployment.chain_id, deployment.address)?;
        tracing::info!(
            chain = %deployment.chain_id,
            address = %deployment.address,
            added,
            "Front end updated"
        );
        Ok(())
    }

    /// Record `address` under `chain_id`. Returns `false` if it was already
    /// listed. A missing file is treated as an empty map.
    pub fn update_contract_addresses(
        &self,
        chain_id: ChainId,
        address: Address,
    ) -> Result<bool, ExportError> {
        let mut addresses = self.read_contract_addresses()?;
        let entry = addresses.entry(chain_id.to_string()).or_default();
        let address = address.to_string();

        if entry.iter().any(|a| a.eq_ignore_ascii_case(&address)) {
            return Ok(false);
        }
        entry.push(address);
        write_json(&self.addresses_path, &addresses)?;
        Ok(true)
    }

    pub fn read_contract_addresses(&self) -> Result<ContractAddresses, ExportError> {
        let contents = match fs::read_to_string(&self.addresses_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ExportError::Io {
                    path: self.addresses_path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| ExportError::Json {
            path: self.addresses_path.clone(),
            source,
        })
    }

    /// Overwrite the interface file.
    pub fn write_abi(&self) -> Result<(), ExportError> {
        write_json(&self.abi_path, &lottery_interface())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_types::test_utils::test_address;

    #[test]
    fn test_update_creates_file_and_skips_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FrontEndExporter::in_dir(dir.path());

        assert!(exporter
            .update_contract_addresses(ChainId::HARDHAT, test_address(1))
            .unwrap());
        assert!(!exporter
            .update_contract_addresses(ChainId::HARDHAT, test_address(1))
            .unwrap());
        assert!(exporter
            .update_contract_addresses(ChainId::HARDHAT, test_address(2))
            .unwrap());
        assert!(exporter
            .update_contract_addresses(ChainId::SEPOLIA, test_address(1))
            .unwrap());

        let addresses = exporter.read_contract_addresses().unwrap();
        assert_eq!(addresses["31337"].len(), 2);
        assert_eq!(addresses["11155111"], vec![test_address(1).to_string()]);
    }

    #[test]
    fn test_existing_entries_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FrontEndExporter::in_dir(dir.path());
        fs::create_dir_all(dir.path().join("constants")).unwrap();
        fs::write(
            exporter.addresses_path(),
            r#"{"5": ["0x0000000000000000000000000000000000000005"]}"#,
        )
        .unwrap();

        exporter
            .update_contract_addresses(ChainId::HARDHAT, test_address(1))
            .unwrap();

        let addresses = exporter.read_contract_addresses().unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses["5"].len(), 1);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FrontEndExporter::in_dir(dir.path());
        fs::create_dir_all(dir.path().join("constants")).unwrap();
        fs::write(exporter.addresses_path(), "not json").unwrap();

        let err = exporter
            .update_contract_addresses(ChainId::HARDHAT, test_address(1))
            .unwrap_err();
        assert!(matches!(err, ExportError::Json { .. }));
    }

    #[test]
    fn test_write_abi() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FrontEndExporter::in_dir(dir.path());
        exporter.write_abi().unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(exporter.abi_path()).unwrap()).unwrap();
        assert_eq!(written, lottery_interface());
    }
}
