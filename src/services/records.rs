//! Structured record storage.
//!
//! Items cross this boundary as JSON objects. The DynamoDB implementation maps
//! them to attribute values and follows pagination so callers always get the
//! full result set.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use super::UpstreamError;

/// Equality condition on a string attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEq {
    pub field: String,
    pub value: String,
}

impl FieldEq {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a JSON item satisfies this condition.
    pub fn matches(&self, item: &Value) -> bool {
        item.get(&self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write (or replace) an item. No conditions, no transactions.
    async fn put(&self, table: &str, item: Value) -> Result<(), UpstreamError>;

    async fn get(&self, table: &str, key: &FieldEq) -> Result<Option<Value>, UpstreamError>;

    async fn delete(&self, table: &str, key: &FieldEq) -> Result<(), UpstreamError>;

    /// Items of `index` whose key equals `key`, optionally filtered.
    async fn query(
        &self,
        table: &str,
        index: &str,
        key: &FieldEq,
        filter: Option<&FieldEq>,
    ) -> Result<Vec<Value>, UpstreamError>;

    /// Every item of `table`, optionally filtered.
    async fn scan(&self, table: &str, filter: Option<&FieldEq>) -> Result<Vec<Value>, UpstreamError>;
}

pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoRecordStore {
    pub fn new(shared: &aws_config::SdkConfig, region: &str) -> Self {
        let config = aws_sdk_dynamodb::config::Builder::from(shared)
            .region(aws_sdk_dynamodb::config::Region::new(region.to_string()))
            .build();
        Self {
            client: aws_sdk_dynamodb::Client::from_conf(config),
        }
    }
}

fn upstream<E: std::error::Error>(e: E) -> UpstreamError {
    UpstreamError::RecordStore(DisplayErrorContext(e).to_string())
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn put(&self, table: &str, item: Value) -> Result<(), UpstreamError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(item)?))
            .send()
            .await
            .map_err(upstream)?;
        Ok(())
    }

    async fn get(&self, table: &str, key: &FieldEq) -> Result<Option<Value>, UpstreamError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(&key.field, AttributeValue::S(key.value.clone()))
            .send()
            .await
            .map_err(upstream)?;
        Ok(output.item.as_ref().map(from_item))
    }

    async fn delete(&self, table: &str, key: &FieldEq) -> Result<(), UpstreamError> {
        self.client
            .delete_item()
            .table_name(table)
            .key(&key.field, AttributeValue::S(key.value.clone()))
            .send()
            .await
            .map_err(upstream)?;
        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        index: &str,
        key: &FieldEq,
        filter: Option<&FieldEq>,
    ) -> Result<Vec<Value>, UpstreamError> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(table)
                .index_name(index)
                .key_condition_expression("#k = :k")
                .expression_attribute_names("#k", &key.field)
                .expression_attribute_values(":k", AttributeValue::S(key.value.clone()))
                .set_exclusive_start_key(start_key.take());
            if let Some(filter) = filter {
                request = request
                    .filter_expression("#f = :f")
                    .expression_attribute_names("#f", &filter.field)
                    .expression_attribute_values(":f", AttributeValue::S(filter.value.clone()));
            }

            let output = request.send().await.map_err(upstream)?;
            items.extend(output.items.unwrap_or_default().iter().map(from_item));

            match output.last_evaluated_key {
                Some(last) if !last.is_empty() => start_key = Some(last),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn scan(&self, table: &str, filter: Option<&FieldEq>) -> Result<Vec<Value>, UpstreamError> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take());
            if let Some(filter) = filter {
                request = request
                    .filter_expression("#f = :f")
                    .expression_attribute_names("#f", &filter.field)
                    .expression_attribute_values(":f", AttributeValue::S(filter.value.clone()));
            }

            let output = request.send().await.map_err(upstream)?;
            items.extend(output.items.unwrap_or_default().iter().map(from_item));

            match output.last_evaluated_key {
                Some(last) if !last.is_empty() => start_key = Some(last),
                _ => break,
            }
        }

        Ok(items)
    }
}

/// JSON object → DynamoDB item.
pub fn to_item(value: Value) -> Result<HashMap<String, AttributeValue>, UpstreamError> {
    match value {
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), to_attribute(v))).collect()),
        other => Err(UpstreamError::Decode(format!("item must be an object, got {other}"))),
    }
}

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => {
            AttributeValue::M(map.iter().map(|(k, v)| (k.clone(), to_attribute(v))).collect())
        }
    }
}

/// DynamoDB item → JSON object.
pub fn from_item(item: &HashMap<String, AttributeValue>) -> Value {
    Value::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), from_attribute(v)))
            .collect::<Map<_, _>>(),
    )
}

pub fn from_attribute(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(from_attribute).collect()),
        AttributeValue::M(map) => from_item(map),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| parse_number(n)).collect()),
        _ => Value::Null,
    }
}

fn parse_number(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = n.parse::<u64>() {
        return Value::Number(u.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
