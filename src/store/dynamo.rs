use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Number, Value};

use super::{Condition, Item, RecordStore, ScanFilter, StoreError, Table, TableNames};

type AttributeMap = HashMap<String, AttributeValue>;

/// DynamoDB-backed [`RecordStore`].
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    tables: TableNames,
    follow_pages: bool,
}

impl DynamoStore {
    pub async fn connect(
        region: &str,
        endpoint: Option<&str>,
        tables: TableNames,
        follow_pages: bool,
    ) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        log::info!("DynamoDB client configured for region {region}");
        Self::with_client(Client::new(&sdk_config), tables, follow_pages)
    }

    pub fn with_client(client: Client, tables: TableNames, follow_pages: bool) -> Self {
        Self {
            client,
            tables,
            follow_pages,
        }
    }

    fn upstream(table: Table, err: impl std::error::Error) -> StoreError {
        StoreError::Upstream {
            table,
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for DynamoStore {
    async fn get_item(&self, table: Table, id: &str) -> Result<Option<Item>, StoreError> {
        log::debug!("get_item {table} id={id}");

        let output = self
            .client
            .get_item()
            .table_name(self.tables.resolve(table))
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| Self::upstream(table, e))?;

        Ok(output.item().map(attribute_map_to_item))
    }

    async fn scan(&self, table: Table, filter: &ScanFilter) -> Result<Vec<Item>, StoreError> {
        log::debug!("scan {table} filter={filter}");

        let expression = FilterExpression::render(filter);
        let mut items = Vec::new();
        let mut start_key: Option<AttributeMap> = None;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(self.tables.resolve(table))
                .set_exclusive_start_key(start_key.take());

            if let Some(expression) = &expression {
                request = request
                    .filter_expression(expression.expression.clone())
                    .set_expression_attribute_names(Some(expression.names.clone()))
                    .set_expression_attribute_values(Some(expression.values.clone()));
            }

            let output = request.send().await.map_err(|e| Self::upstream(table, e))?;
            items.extend(output.items().iter().map(attribute_map_to_item));

            match next_page(output.last_evaluated_key(), self.follow_pages) {
                PageStep::Continue(key) => start_key = Some(key),
                PageStep::Truncated => {
                    log::warn!("scan of {table} truncated after one page");
                    break;
                }
                PageStep::Done => break,
            }
        }

        Ok(items)
    }
}

/// What a scan does after receiving one page.
#[derive(Debug, PartialEq)]
enum PageStep {
    Continue(AttributeMap),
    Truncated,
    Done,
}

fn next_page(last_evaluated_key: Option<&AttributeMap>, follow_pages: bool) -> PageStep {
    match last_evaluated_key {
        Some(key) if !key.is_empty() => {
            if follow_pages {
                PageStep::Continue(key.clone())
            } else {
                PageStep::Truncated
            }
        }
        _ => PageStep::Done,
    }
}

/// A rendered DynamoDB filter expression with its placeholder bindings.
#[derive(Debug, Clone, PartialEq)]
struct FilterExpression {
    expression: String,
    names: HashMap<String, String>,
    values: AttributeMap,
}

impl FilterExpression {
    fn render(filter: &ScanFilter) -> Option<Self> {
        if filter.is_empty() {
            return None;
        }

        let mut clauses = Vec::with_capacity(filter.conditions.len());
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for (index, condition) in filter.conditions.iter().enumerate() {
            let name = format!("#n{index}");
            let value = format!(":v{index}");

            clauses.push(match condition {
                Condition::Equals { .. } => format!("{name} = {value}"),
                Condition::Contains { .. } => format!("contains({name}, {value})"),
            });
            names.insert(name, condition.attribute().to_string());
            values.insert(value, json_to_attribute(condition.value()));
        }

        let joiner = filter.combinator.keyword();
        Some(Self {
            expression: clauses.join(joiner),
            names,
            values,
        })
    }
}

fn attribute_map_to_item(map: &AttributeMap) -> Item {
    map.iter()
        .map(|(key, value)| (key.clone(), attribute_to_json(value)))
        .collect()
}

fn number_to_json(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(int) = raw.parse::<u64>() {
        return Value::Number(int.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(list) => Value::Array(list.iter().map(attribute_to_json).collect()),
        AttributeValue::M(map) => Value::Object(attribute_map_to_item(map)),
        AttributeValue::Ss(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(set) => Value::Array(set.iter().map(|n| number_to_json(n)).collect()),
        AttributeValue::B(blob) => Value::String(STANDARD.encode(blob.as_ref())),
        AttributeValue::Bs(set) => Value::Array(
            set.iter()
                .map(|blob| Value::String(STANDARD.encode(blob.as_ref())))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Null => AttributeValue::Null(true),
        Value::Array(list) => AttributeValue::L(list.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(key, value)| (key.clone(), json_to_attribute(value)))
                .collect(),
        ),
    }
}
