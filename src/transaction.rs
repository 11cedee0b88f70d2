use serde_json::{json, Value};

use crate::asset::AssetAmount;
use crate::block::BlockData;
use crate::crypto::{hash, EchoHash, PrivateKey};
use crate::error::{EchoError, Result};
use crate::operations::Operation;
use crate::serialize::{serialize_vec, ByteSerializable, Extensions};

/// Operations plus the TaPoS header, ready to be signed and broadcast.
///
/// Attached private keys only ever feed [`Transaction::sign`]; they are not part of either
/// encoding. Changing the header or the fees drops existing signatures.
#[derive(Debug, Clone)]
pub struct Transaction {
    block_data: BlockData,
    operations: Vec<Operation>,
    chain_id: String,
    private_keys: Vec<PrivateKey>,
    signatures: Vec<Vec<u8>>,
    extensions: Extensions,
}

impl Transaction {
    pub fn new(block_data: BlockData, operations: Vec<Operation>, chain_id: &str) -> Transaction {
        Transaction {
            block_data,
            operations,
            chain_id: chain_id.to_string(),
            private_keys: vec![],
            signatures: vec![],
            extensions: Extensions::new(),
        }
    }

    pub fn add_private_key(&mut self, private_key: PrivateKey) {
        self.private_keys.push(private_key);
    }

    pub fn set_block_data(&mut self, block_data: BlockData) {
        self.block_data = block_data;
        self.signatures.clear();
    }

    /// Replace the fee of every operation, in order. Signatures become stale and are dropped.
    pub fn set_fees(&mut self, fees: &[AssetAmount]) -> Result<()> {
        if fees.len() != self.operations.len() {
            return Err(EchoError::MalformedInput(format!(
                "{} fees for {} operations",
                fees.len(),
                self.operations.len()
            )));
        }
        for (operation, fee) in self.operations.iter_mut().zip(fees) {
            operation.set_fee(*fee);
        }
        self.signatures.clear();
        Ok(())
    }

    /// `chain_id || transaction bytes`, the signing pre-image.
    pub fn serialize_for_signature(&self) -> Result<Vec<u8>> {
        let mut vbytes = hex::decode(&self.chain_id)
            .map_err(|error| EchoError::MalformedInput(format!("chain id `{}`: {}", self.chain_id, error)))?;
        vbytes.extend(self.to_bytes());
        Ok(vbytes)
    }

    pub fn get_hash_for_signature(&self) -> Result<EchoHash> {
        Ok(hash(&self.serialize_for_signature()?))
    }

    /// Sign with every attached key. One signature per key, in the order the keys were added.
    pub fn sign(&mut self) -> Result<&[Vec<u8>]> {
        let digest = self.get_hash_for_signature()?;
        let signatures = self
            .private_keys
            .iter()
            .map(|private_key| private_key.sign_digest(&digest))
            .collect::<Result<Vec<Vec<u8>>>>()?;
        self.signatures = signatures;
        Ok(&self.signatures)
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    pub fn get_block_data(&self) -> &BlockData {
        &self.block_data
    }

    pub fn get_operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn get_chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn get_signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    /// The form `broadcast_transaction_with_callback` takes.
    pub fn to_json(&self) -> Result<Value> {
        let operations = self
            .operations
            .iter()
            .map(Operation::to_json)
            .collect::<Result<Vec<Value>>>()?;
        let signatures: Vec<String> = self.signatures.iter().map(hex::encode).collect();
        Ok(json!({
            "ref_block_num": self.block_data.get_ref_block_num(),
            "ref_block_prefix": self.block_data.get_ref_block_prefix(),
            "expiration": self.block_data.expiration_string(),
            "operations": operations,
            "extensions": self.extensions,
            "signatures": signatures,
        }))
    }
}

impl ByteSerializable for Transaction {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.block_data.to_bytes());
        vbytes.extend(serialize_vec(&self.operations));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}
