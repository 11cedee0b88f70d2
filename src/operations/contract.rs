use serde::{Deserialize, Serialize};

use crate::asset::{AssetAmount, ECHO_ASSET_ID};
use crate::error::{EchoError, Result};
use crate::object::ObjectId;
use crate::serialize::{serialize_string, ByteSerializable, Extensions};

/// Gas limit used when the caller does not set one.
pub const DEFAULT_GAS: u64 = 1_000_000;

/// Deploy contract bytecode. `code` is the hex-encoded bytecode plus constructor arguments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContractCreateOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub registrar: ObjectId,
    pub asset_id: ObjectId,
    #[serde(default)]
    pub value: u64,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: u64,
    pub gas: u64,
    pub code: String,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for ContractCreateOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.registrar.to_bytes());
        // no receiver
        vbytes.push(0);
        vbytes.extend(self.asset_id.to_bytes());
        vbytes.extend(&self.value.to_le_bytes());
        vbytes.extend(&self.gas_price.to_le_bytes());
        vbytes.extend(&self.gas.to_le_bytes());
        vbytes.extend(serialize_string(&self.code));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

/// Call a method on a deployed contract. `code` is the hex-encoded method selector and arguments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContractCallOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub registrar: ObjectId,
    pub receiver: ObjectId,
    pub asset_id: ObjectId,
    #[serde(default)]
    pub value: u64,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: u64,
    pub gas: u64,
    pub code: String,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for ContractCallOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.registrar.to_bytes());
        vbytes.push(1);
        vbytes.extend(self.receiver.to_bytes());
        vbytes.extend(self.asset_id.to_bytes());
        vbytes.extend(&self.value.to_le_bytes());
        vbytes.extend(&self.gas_price.to_le_bytes());
        vbytes.extend(&self.gas.to_le_bytes());
        vbytes.extend(serialize_string(&self.code));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

/// Produced by the chain when a contract moves funds. Clients only read it from history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContractTransferOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub contract_id: ObjectId,
    pub to: ObjectId,
    pub amount: AssetAmount,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ContractTransferOperation {
    pub fn new(contract_id: ObjectId, to: ObjectId, amount: AssetAmount) -> Self {
        ContractTransferOperation {
            fee: AssetAmount::zero(),
            contract_id,
            to,
            amount,
            extensions: Extensions::new(),
        }
    }
}

impl ByteSerializable for ContractTransferOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.contract_id.to_bytes());
        vbytes.extend(self.to.to_bytes());
        vbytes.extend(self.amount.to_bytes());
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[derive(Debug)]
pub struct ContractCreateOperationBuilder {
    fee: Option<AssetAmount>,
    registrar: Option<ObjectId>,
    asset_id: ObjectId,
    value: u64,
    gas_price: u64,
    gas: u64,
    code: Option<String>,
}

impl Default for ContractCreateOperationBuilder {
    fn default() -> Self {
        ContractCreateOperationBuilder {
            fee: None,
            registrar: None,
            asset_id: ECHO_ASSET_ID,
            value: 0,
            gas_price: 0,
            gas: DEFAULT_GAS,
            code: None,
        }
    }
}

impl ContractCreateOperationBuilder {
    pub fn new() -> Self {
        ContractCreateOperationBuilder::default()
    }

    pub fn set_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn set_registrar(mut self, registrar: ObjectId) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn set_asset_id(mut self, asset_id: ObjectId) -> Self {
        self.asset_id = asset_id;
        self
    }

    pub fn set_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    pub fn set_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn set_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn set_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn build(self) -> Result<ContractCreateOperation> {
        Ok(ContractCreateOperation {
            fee: self.fee.unwrap_or_else(AssetAmount::zero),
            registrar: self.registrar.ok_or(EchoError::MissingField("registrar"))?,
            asset_id: self.asset_id,
            value: self.value,
            gas_price: self.gas_price,
            gas: self.gas,
            code: self.code.ok_or(EchoError::MissingField("code"))?,
            extensions: Extensions::new(),
        })
    }
}

#[derive(Debug)]
pub struct ContractCallOperationBuilder {
    fee: Option<AssetAmount>,
    registrar: Option<ObjectId>,
    receiver: Option<ObjectId>,
    asset_id: ObjectId,
    value: u64,
    gas_price: u64,
    gas: u64,
    code: Option<String>,
}

impl Default for ContractCallOperationBuilder {
    fn default() -> Self {
        ContractCallOperationBuilder {
            fee: None,
            registrar: None,
            receiver: None,
            asset_id: ECHO_ASSET_ID,
            value: 0,
            gas_price: 0,
            gas: DEFAULT_GAS,
            code: None,
        }
    }
}

impl ContractCallOperationBuilder {
    pub fn new() -> Self {
        ContractCallOperationBuilder::default()
    }

    pub fn set_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn set_registrar(mut self, registrar: ObjectId) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn set_receiver(mut self, receiver: ObjectId) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn set_asset_id(mut self, asset_id: ObjectId) -> Self {
        self.asset_id = asset_id;
        self
    }

    pub fn set_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    pub fn set_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn set_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn set_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn build(self) -> Result<ContractCallOperation> {
        Ok(ContractCallOperation {
            fee: self.fee.unwrap_or_else(AssetAmount::zero),
            registrar: self.registrar.ok_or(EchoError::MissingField("registrar"))?,
            receiver: self.receiver.ok_or(EchoError::MissingField("receiver"))?,
            asset_id: self.asset_id,
            value: self.value,
            gas_price: self.gas_price,
            gas: self.gas,
            code: self.code.ok_or(EchoError::MissingField("code"))?,
            extensions: Extensions::new(),
        })
    }
}
