use aws_lambda_events::apigw::ApiGatewayProxyRequest;
use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
use aws_sdk_dynamodb::operation::query::QueryOutput;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_smithy_mocks::{mock, mock_client, Rule, RuleMode};
use model::{ActivityRecord, ActivityRequest, Status, Timestamp};
use std::collections::HashMap;

/// Test table name
pub const TEST_TABLE: &str = "userActivities";

/// Build a request for user `u1`
pub fn request_at(timestamp: Timestamp, status: Status) -> ActivityRequest {
    ActivityRequest {
        user_id: "u1".to_string(),
        timestamp,
        status,
    }
}

/// Prior records for user `u1` from `(timestamp, status)` pairs
pub fn records_for_u1(entries: &[(Timestamp, i64)]) -> Vec<ActivityRecord> {
    entries
        .iter()
        .map(|&(timestamp, status)| ActivityRecord::new("u1", timestamp, Status(status)))
        .collect()
}

/// Convert a record into the DynamoDB item the SDK would return
pub fn record_item(record: &ActivityRecord) -> HashMap<String, AttributeValue> {
    serde_dynamo::to_item(record).expect("Record should convert to an item")
}

/// A query rule returning `records` as a single page, for any query
fn query_rule_returning(records: Vec<ActivityRecord>) -> Rule {
    let items: Vec<HashMap<String, AttributeValue>> = records.iter().map(record_item).collect();

    mock!(aws_sdk_dynamodb::Client::query)
        .match_requests(|_| true)
        .sequence()
        .output(move || {
            QueryOutput::builder()
                .set_count(Some(items.len() as i32))
                .set_items(Some(items.clone()))
                .build()
        })
        .repeatedly()
        .build()
}

/// A put rule accepting any item
fn put_rule_accepting() -> Rule {
    mock!(aws_sdk_dynamodb::Client::put_item)
        .match_requests(|_| true)
        .sequence()
        .output(|| PutItemOutput::builder().build())
        .repeatedly()
        .build()
}

/// A mock DynamoDB client which returns `records` for every query
/// and accepts every put
pub fn create_mock_dynamodb_client(records: Vec<ActivityRecord>) -> aws_sdk_dynamodb::Client {
    let query_rule: Rule = query_rule_returning(records);
    let put_rule: Rule = put_rule_accepting();

    mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&query_rule, &put_rule])
}

/// Create a dummy API Gateway proxy request with a set body
pub fn apigw_request_with_body(body: Option<&str>) -> ApiGatewayProxyRequest {
    let mut request: ApiGatewayProxyRequest = ApiGatewayProxyRequest::default();
    request.path = Some("/activities".to_string());
    request.body = body.map(str::to_string);

    request
}

/// JSON body for a request
pub fn request_body(request: &ActivityRequest) -> String {
    serde_json::to_string(request).expect("Request should serialise")
}
