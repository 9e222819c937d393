use async_trait::async_trait;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryError, QueryOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use lambda_runtime::tracing;
use ledger::LedgerErrorReason::{BackendFailure, BadRecord};
use ledger::LedgerOperation::{Put, Query};
use ledger::{LedgerError, LedgerQuery, LedgerStore};
use model::{ActivityRecord, SortOrder};
use std::collections::HashMap;

mod config;

pub use config::{StoreConfig, StoreConfigError};

/// Attribute names, matching the serde names on `ActivityRecord`
pub const USER_ID: &str = "userID";
pub const TIMESTAMP: &str = "timestamp";

const PARTITION_CONDITION: &str = "#userID = :userID";
const WINDOWED_CONDITION: &str = "#userID = :userID AND #timestamp > :timestamp";

type Item = HashMap<String, AttributeValue>;

/// Ledger stored in a DynamoDB table with `userID` (S) as the partition key
/// and `timestamp` (N) as the sort key.
pub struct DynamoDbLedgerStore {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
    consistent_read: bool,
}

impl DynamoDbLedgerStore {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        DynamoDbLedgerStore {
            table_name: table_name.into(),
            dynamodb_client,
            consistent_read: false,
        }
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn from_config(dynamodb_client: aws_sdk_dynamodb::Client, config: &StoreConfig) -> Self {
        DynamoDbLedgerStore::new(dynamodb_client, config.table_name.clone())
            .with_consistent_read(config.consistent_read)
    }
}

#[async_trait]
impl LedgerStore for DynamoDbLedgerStore {
    async fn query(&self, query: LedgerQuery) -> Result<Vec<ActivityRecord>, LedgerError> {
        let mut records: Vec<ActivityRecord> = Vec::new();
        let mut start_key: Option<Item> = None;

        // Follow pages until exhausted or the limit is satisfied
        loop {
            let remaining: Option<u32> = query
                .limit
                .map(|limit| limit.saturating_sub(records.len() as u32));

            if remaining == Some(0) {
                break;
            }

            let output: QueryOutput = self
                .query_page(&query, remaining, start_key.take())
                .await
                .map_err(|err| {
                    LedgerError::new(query.user_id.clone(), Query, BackendFailure(err.into()))
                })?;

            let page: Vec<ActivityRecord> =
                serde_dynamo::from_items(output.items.unwrap_or_default()).map_err(|err| {
                    LedgerError::new(query.user_id.clone(), Query, BadRecord(err.to_string()))
                })?;

            tracing::debug!(
                user_id = %query.user_id,
                page_size = page.len(),
                "Read ledger page"
            );

            records.extend(page);

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn put(&self, record: ActivityRecord) -> Result<(), LedgerError> {
        let item: Item = serde_dynamo::to_item(&record).map_err(|err| {
            LedgerError::new(record.user_id.clone(), Put, BadRecord(err.to_string()))
        })?;

        self.put_item(item).await.map_err(|err| {
            LedgerError::new(record.user_id.clone(), Put, BackendFailure(err.into()))
        })?;

        Ok(())
    }
}

impl DynamoDbLedgerStore {
    async fn query_page(
        &self,
        query: &LedgerQuery,
        limit: Option<u32>,
        start_key: Option<Item>,
    ) -> Result<QueryOutput, SdkError<QueryError, HttpResponse>> {
        // Both names are reserved words in DynamoDB expressions
        let request = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .consistent_read(self.consistent_read)
            .expression_attribute_names("#userID", USER_ID)
            .expression_attribute_values(":userID", AttributeValue::S(query.user_id.clone()))
            .scan_index_forward(query.order == SortOrder::OldestFirst)
            .set_limit(limit.map(|limit| i32::try_from(limit).unwrap_or(i32::MAX)))
            .set_exclusive_start_key(start_key);

        let request = match query.after {
            Some(after) => request
                .key_condition_expression(WINDOWED_CONDITION)
                .expression_attribute_names("#timestamp", TIMESTAMP)
                .expression_attribute_values(":timestamp", AttributeValue::N(after.to_string())),
            None => request.key_condition_expression(PARTITION_CONDITION),
        };

        request.send().await
    }

    async fn put_item(
        &self,
        item: Item,
    ) -> Result<PutItemOutput, SdkError<PutItemError, HttpResponse>> {
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::put_item::PutItemInput;
    use aws_sdk_dynamodb::operation::query::QueryInput;
    use aws_sdk_dynamodb::types::error::ResourceNotFoundException;
    use aws_smithy_mocks::{mock, mock_client, Rule, RuleMode};
    use ledger::LedgerErrorReason;
    use model::Status;
    use test_utils::{create_mock_dynamodb_client, record_item, TEST_TABLE};

    fn store(client: aws_sdk_dynamodb::Client) -> DynamoDbLedgerStore {
        DynamoDbLedgerStore::new(client, TEST_TABLE)
    }

    #[tokio::test]
    async fn query_decodes_records() {
        let prior: Vec<ActivityRecord> = vec![
            ActivityRecord::new("u1", 900, Status::START),
            ActivityRecord::new("u1", 500, Status(2)),
        ];

        let records: Vec<ActivityRecord> = store(create_mock_dynamodb_client(prior.clone()))
            .query(LedgerQuery::for_user("u1"))
            .await
            .expect("Query should succeed");

        assert_eq!(prior, records);
    }

    #[tokio::test]
    async fn windowed_query_sends_key_condition() {
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| {
                let values = input.expression_attribute_values();

                input.table_name() == Some(TEST_TABLE)
                    && input.key_condition_expression() == Some(WINDOWED_CONDITION)
                    && input.scan_index_forward() == Some(false)
                    && input.limit().is_none()
                    && values.and_then(|v| v.get(":userID"))
                        == Some(&AttributeValue::S("u1".to_string()))
                    && values.and_then(|v| v.get(":timestamp"))
                        == Some(&AttributeValue::N("13600".to_string()))
            })
            .then_output(|| QueryOutput::builder().build());

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);

        let records: Vec<ActivityRecord> = store(client)
            .query(LedgerQuery::for_user("u1").after(100_000 - 86_400))
            .await
            .expect("Query should match the expected request");

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn store_from_config_reads_consistently() {
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| {
                input.table_name() == Some("activities-prod")
                    && input.consistent_read() == Some(true)
            })
            .then_output(|| QueryOutput::builder().build());

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);
        let config: StoreConfig = StoreConfig {
            table_name: "activities-prod".to_string(),
            region: None,
            consistent_read: true,
        };

        DynamoDbLedgerStore::from_config(client, &config)
            .query(LedgerQuery::for_user("u1"))
            .await
            .expect("Query should match the expected request");
    }

    #[tokio::test]
    async fn capped_query_sends_limit() {
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| {
                input.key_condition_expression() == Some(PARTITION_CONDITION)
                    && input.limit() == Some(50)
            })
            .then_output(|| QueryOutput::builder().build());

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);

        store(client)
            .query(LedgerQuery::for_user("u1").limit(50))
            .await
            .expect("Query should match the expected request");
    }

    #[tokio::test]
    async fn query_follows_pagination() {
        let first_page: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| input.exclusive_start_key().is_none())
            .sequence()
            .output(|| {
                QueryOutput::builder()
                    .items(record_item(&ActivityRecord::new("u1", 900, Status(2))))
                    .last_evaluated_key(USER_ID, AttributeValue::S("u1".to_string()))
                    .last_evaluated_key(TIMESTAMP, AttributeValue::N("900".to_string()))
                    .build()
            })
            .repeatedly()
            .build();
        let second_page: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| input.exclusive_start_key().is_some())
            .sequence()
            .output(|| {
                QueryOutput::builder()
                    .items(record_item(&ActivityRecord::new("u1", 500, Status::START)))
                    .build()
            })
            .repeatedly()
            .build();

        let client: aws_sdk_dynamodb::Client = mock_client!(
            aws_sdk_dynamodb,
            RuleMode::MatchAny,
            [&first_page, &second_page]
        );

        let records: Vec<ActivityRecord> = store(client)
            .query(LedgerQuery::for_user("u1"))
            .await
            .expect("Query should succeed");

        assert_eq!(
            vec![
                ActivityRecord::new("u1", 900, Status(2)),
                ActivityRecord::new("u1", 500, Status::START),
            ],
            records
        );
    }

    #[tokio::test]
    async fn capped_query_stops_once_limit_is_met() {
        let first_page: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| {
                input.exclusive_start_key().is_none() && input.limit() == Some(3)
            })
            .sequence()
            .output(|| {
                QueryOutput::builder()
                    .items(record_item(&ActivityRecord::new("u1", 900, Status(2))))
                    .items(record_item(&ActivityRecord::new("u1", 800, Status(2))))
                    .last_evaluated_key(USER_ID, AttributeValue::S("u1".to_string()))
                    .last_evaluated_key(TIMESTAMP, AttributeValue::N("800".to_string()))
                    .build()
            })
            .build();
        // More pages remain after this one, the cap ends the scan
        let second_page: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| {
                input.exclusive_start_key().is_some() && input.limit() == Some(1)
            })
            .sequence()
            .output(|| {
                QueryOutput::builder()
                    .items(record_item(&ActivityRecord::new("u1", 700, Status::START)))
                    .last_evaluated_key(USER_ID, AttributeValue::S("u1".to_string()))
                    .last_evaluated_key(TIMESTAMP, AttributeValue::N("700".to_string()))
                    .build()
            })
            .build();

        let client: aws_sdk_dynamodb::Client = mock_client!(
            aws_sdk_dynamodb,
            RuleMode::MatchAny,
            [&first_page, &second_page]
        );

        let records: Vec<ActivityRecord> = store(client)
            .query(LedgerQuery::for_user("u1").limit(3))
            .await
            .expect("Query should stop after two pages");

        assert_eq!(
            vec![
                ActivityRecord::new("u1", 900, Status(2)),
                ActivityRecord::new("u1", 800, Status(2)),
                ActivityRecord::new("u1", 700, Status::START),
            ],
            records
        );
        assert_eq!(1, first_page.num_calls());
        assert_eq!(1, second_page.num_calls());
    }

    #[tokio::test]
    async fn oldest_first_scans_forward() {
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|input: &QueryInput| input.scan_index_forward() == Some(true))
            .then_output(|| QueryOutput::builder().build());

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);

        store(client)
            .query(LedgerQuery {
                order: SortOrder::OldestFirst,
                ..LedgerQuery::for_user("u1")
            })
            .await
            .expect("Query should match the expected request");
    }

    #[tokio::test]
    async fn zero_limit_skips_the_table() {
        // Any request reaching the client fails to match
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query)
            .match_requests(|_| false)
            .then_output(|| QueryOutput::builder().build());

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);

        let records: Vec<ActivityRecord> = store(client)
            .query(LedgerQuery::for_user("u1").limit(0))
            .await
            .expect("Query should succeed without a request");

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn query_failure_is_backend_failure() {
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query).then_error(|| {
            QueryError::ResourceNotFoundException(
                ResourceNotFoundException::builder()
                    .message("table missing")
                    .build(),
            )
        });

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);

        let err: LedgerError = store(client)
            .query(LedgerQuery::for_user("u1"))
            .await
            .expect_err("Query should fail");

        assert_eq!(Query, err.operation);
        assert!(matches!(err.reason, LedgerErrorReason::BackendFailure(_)));
    }

    #[tokio::test]
    async fn undecodable_item_is_bad_record() {
        let query_rule: Rule = mock!(aws_sdk_dynamodb::Client::query).then_output(|| {
            QueryOutput::builder()
                .items(HashMap::from([(
                    USER_ID.to_string(),
                    AttributeValue::S("u1".to_string()),
                )]))
                .build()
        });

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule]);

        let err: LedgerError = store(client)
            .query(LedgerQuery::for_user("u1"))
            .await
            .expect_err("Query should fail to decode");

        assert!(matches!(err.reason, LedgerErrorReason::BadRecord(_)));
    }

    #[tokio::test]
    async fn put_writes_record_attributes() {
        let put_rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .match_requests(|input: &PutItemInput| {
                let item = input.item();

                input.table_name() == Some(TEST_TABLE)
                    && item.and_then(|i| i.get(USER_ID))
                        == Some(&AttributeValue::S("u1".to_string()))
                    && item.and_then(|i| i.get(TIMESTAMP))
                        == Some(&AttributeValue::N("1000".to_string()))
                    && item.and_then(|i| i.get("status"))
                        == Some(&AttributeValue::N("4".to_string()))
            })
            .then_output(|| PutItemOutput::builder().build());

        let client: aws_sdk_dynamodb::Client =
            mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&put_rule]);

        store(client)
            .put(ActivityRecord::new("u1", 1000, Status::CLOSING))
            .await
            .expect("Put should match the expected request");
    }
}
