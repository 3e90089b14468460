//! `fetch`-backed [`HttpClient`] for browser hosts.
//!
//! Reachability probes are `HEAD` requests with a short timeout; the timer
//! races the fetch and aborts it through an `AbortController` when it fires.
//! `HEAD` responses have no body to read. There is no retry loop: a browser
//! host gets exactly one attempt per request.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
    logger::redact_url,
};
use bytes::Bytes;
use futures::{
    future::{select, Either},
    pin_mut, FutureExt,
};
use gloo_timers::future::TimeoutFuture;
use js_sys::{try_iter, Array, Uint8Array};
use std::{collections::HashMap, time::Duration};
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, RequestMode, Response, Window};

use crate::error::{js_message, WasmError};

/// HTTP client over the window's `fetch`.
pub struct WasmHttpClient {
    window: Window,
}

impl WasmHttpClient {
    pub fn new() -> BridgeResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| WasmError::NotAvailable("window".to_string()))?;
        Ok(Self { window })
    }

    async fn send(&self, request: &HttpRequest) -> BridgeResult<Response> {
        let controller = match request.timeout {
            Some(_) => Some(
                AbortController::new().map_err(|err| js_error("create abort controller", err))?,
            ),
            None => None,
        };

        let init = request_init(request, controller.as_ref())?;
        let req = Request::new_with_str_and_init(&request.url, &init)
            .map_err(|err| js_error("build request", err))?;
        let fetch = JsFuture::from(self.window.fetch_with_request(&req));

        let outcome = match (request.timeout, controller) {
            (Some(timeout), Some(controller)) => {
                let Some(outcome) = race_timeout(fetch, timeout).await else {
                    controller.abort();
                    return Err(BridgeError::OperationFailed(format!(
                        "Request timed out after {} ms",
                        timeout.as_millis()
                    )));
                };
                outcome
            }
            _ => fetch.await,
        };

        outcome
            .map_err(|err| js_error("fetch", err))?
            .dyn_into::<Response>()
            .map_err(|_| BridgeError::OperationFailed("fetch returned non-Response".into()))
    }
}

#[async_trait(?Send)]
impl HttpClient for WasmHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let response = self.send(&request).await?;
        let status = response.status();

        let body = match request.method {
            HttpMethod::Head => Bytes::new(),
            _ => read_body(&response).await?,
        };

        debug!(
            method = method_to_str(request.method),
            url = %redact_url(&request.url),
            status,
            "fetch completed"
        );

        Ok(HttpResponse {
            status,
            headers: response_headers(&response.headers())?,
            body,
        })
    }
}

fn request_init(
    request: &HttpRequest,
    controller: Option<&AbortController>,
) -> BridgeResult<RequestInit> {
    let init = RequestInit::new();
    init.set_method(method_to_str(request.method));
    init.set_mode(RequestMode::Cors);

    if let Some(controller) = controller {
        init.set_signal(Some(&controller.signal()));
    }
    if let Some(body) = &request.body {
        init.set_body(&Uint8Array::from(body.as_ref()).into());
    }

    let headers = Headers::new().map_err(|err| js_error("create headers", err))?;
    for (key, value) in &request.headers {
        headers
            .set(key, value)
            .map_err(|err| js_error("set header", err))?;
    }
    init.set_headers(&headers);

    Ok(init)
}

/// `None` when `timeout` elapsed first.
async fn race_timeout(
    fetch: JsFuture,
    timeout: Duration,
) -> Option<Result<JsValue, JsValue>> {
    let timer = TimeoutFuture::new(timeout.as_millis().min(u32::MAX as u128) as u32).map(|_| ());
    pin_mut!(fetch);
    pin_mut!(timer);

    match select(fetch, timer).await {
        Either::Left((outcome, _)) => Some(outcome),
        Either::Right(_) => None,
    }
}

async fn read_body(response: &Response) -> BridgeResult<Bytes> {
    let promise = response
        .array_buffer()
        .map_err(|err| js_error("response.array_buffer", err))?;
    let buffer = JsFuture::from(promise)
        .await
        .map_err(|err| js_error("response buffer", err))?;
    Ok(Bytes::from(Uint8Array::new(&buffer).to_vec()))
}

fn response_headers(headers: &Headers) -> BridgeResult<HashMap<String, String>> {
    let entries = try_iter(headers.as_ref())
        .map_err(|err| js_error("iterate headers", err))?
        .ok_or_else(|| BridgeError::OperationFailed("Headers are not iterable".into()))?;

    let mut map = HashMap::new();
    for entry in entries {
        let pair = Array::from(&entry.map_err(|err| js_error("header entry", err))?);
        if let (Some(key), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
            map.insert(key, value);
        }
    }
    Ok(map)
}

fn method_to_str(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
        HttpMethod::Head => "HEAD",
    }
}

fn js_error(context: &str, err: JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("fetch {context}: {}", js_message(&err)))
}
