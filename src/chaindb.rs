//! Persistent on-disk store for the JUL chain.
//!
//! Stores every block in order as its own JSON file plus one snapshot of
//! per-address balances, so a restart rebuilds the identical ledger state.
//! The validator registry is not stored: it is reconstructed from staked
//! balances at load time. The mempool does not survive a restart.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use tokio::fs;

use crate::ledger::{Account, Block};

/// On-disk chain database rooted at one directory.
#[derive(Debug, Clone)]
pub struct ChainDb {
    path: PathBuf,
}

impl ChainDb {
    /// Opens or creates a database directory.
    pub async fn open<P: Into<PathBuf>>(path: P) -> io::Result<ChainDb> {
        let path = path.into();
        fs::create_dir_all(&path).await?;
        Ok(ChainDb { path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Writes the full chain and balance snapshot. Blocks land as
    /// `block_<index>.json`; balances as `state.json`. Stale block files
    /// beyond the current length are removed.
    pub async fn save(
        &self,
        blocks: &[Block],
        accounts: &HashMap<String, Account>,
    ) -> io::Result<()> {
        for block in blocks {
            let data = serde_json::to_vec_pretty(block).map_err(invalid_data)?;
            fs::write(self.block_path(block.index), data).await?;
        }
        self.remove_blocks_from(blocks.len() as u64).await?;

        let state = serde_json::to_vec_pretty(accounts).map_err(invalid_data)?;
        fs::write(self.path.join("state.json"), state).await?;
        Ok(())
    }

    /// Loads the persisted chain and balances, or `None` for an empty
    /// database. Blocks must be contiguous from index 0.
    pub async fn load(&self) -> io::Result<Option<(Vec<Block>, HashMap<String, Account>)>> {
        let mut blocks = Vec::new();
        loop {
            let path = self.block_path(blocks.len() as u64);
            match fs::read(&path).await {
                Ok(data) => {
                    let block: Block = serde_json::from_slice(&data).map_err(invalid_data)?;
                    blocks.push(block);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(e),
            }
        }
        if blocks.is_empty() {
            return Ok(None);
        }

        let accounts = match fs::read(self.path.join("state.json")).await {
            Ok(data) => serde_json::from_slice(&data).map_err(invalid_data)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Some((blocks, accounts)))
    }

    fn block_path(&self, index: u64) -> PathBuf {
        self.path.join(format!("block_{index}.json"))
    }

    async fn remove_blocks_from(&self, first_stale: u64) -> io::Result<()> {
        let mut index = first_stale;
        loop {
            let path = self.block_path(index);
            match fs::remove_file(&path).await {
                Ok(()) => index += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn invalid_data(e: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}
