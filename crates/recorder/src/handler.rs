use crate::error::RecorderError;
use crate::recorder::ActivityRecorder;
use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use lambda_runtime::tracing::{Instrument, Span};
use lambda_runtime::{tracing, LambdaEvent};
use model::{ActivityResponse, Error};

const ALLOWED_HEADERS: &str = "origin,Accept,Authorization,Content-Type";

/// Lambda handler for an API Gateway proxy request.
///
/// Recorder failures are rendered as an HTTP response with the error text as
/// the body. Only a response that can't be serialised is returned as an `Err`.
pub async fn activity_fn(
    recorder: &ActivityRecorder,
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let (request, context) = event.into_parts();
    let request_id: String = context.request_id;

    let span: Span = tracing::span!(tracing::Level::INFO, "Activity", request_id = %request_id);

    tracing::debug!(parent: &span, body = ?request.body, "Received request");

    let result: Result<ActivityResponse, RecorderError> = if request.is_base64_encoded {
        Err(RecorderError::MalformedRequest(
            "base64 encoded bodies are not supported".to_string(),
        ))
    } else {
        recorder
            .handle_body(request.body.as_deref())
            .instrument(span.clone())
            .await
    };

    match result {
        Ok(response) => success_response(&response),
        Err(err) => {
            tracing::error!(parent: &span, "Failed to record activity, {err}");

            Ok(error_response(&err, recorder.config().distinct_error_codes))
        }
    }
}

fn success_response(response: &ActivityResponse) -> Result<ApiGatewayProxyResponse, Error> {
    let mut headers: HeaderMap = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut proxy_response: ApiGatewayProxyResponse = ApiGatewayProxyResponse::default();
    proxy_response.status_code = 200;
    proxy_response.headers = headers;
    proxy_response.body = Some(Body::Text(serde_json::to_string(response)?));

    Ok(proxy_response)
}

fn error_response(err: &RecorderError, distinct_error_codes: bool) -> ApiGatewayProxyResponse {
    let mut headers: HeaderMap = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

    let mut proxy_response: ApiGatewayProxyResponse = ApiGatewayProxyResponse::default();
    proxy_response.status_code = err.status_code(distinct_error_codes);
    proxy_response.headers = headers;
    proxy_response.body = Some(Body::Text(err.to_string()));

    proxy_response
}
