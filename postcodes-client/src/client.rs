//! postcodes.io domain client.
//!
//! One method per API capability. Arguments are validated locally first,
//! then a single request goes through the [`RequestPipeline`] and the
//! resulting [`Response`] is projected into plain records.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::PostcodesError;
use crate::geo::{Coordinate, haversine_km};
use crate::pipeline::{Method, Params, RequestPipeline};
use crate::postcode::{Outcode, Postcode, PostcodePrefix};
use crate::response::{Key, Response, ResponseError, ValueKind};
use crate::transport::{HttpTransport, ReqwestTransport};

/// A flat postcode (or outcode) record as returned by the API.
pub type Record = Map<String, Value>;

/// Maximum number of items in one bulk request.
pub const BULK_LIMIT: usize = 100;

/// Autocomplete limit used when the caller has no preference.
pub const DEFAULT_AUTOCOMPLETE_LIMIT: i64 = 10;

const POSTCODES_END: &str = "/postcodes";
const OUTCODES_END: &str = "/outcodes";
const RANDOM_POSTCODES_END: &str = "/random/postcodes";

/// Client for the postcodes.io API.
///
/// Operations take `&mut self`: the transport keeps its configuration
/// between calls, and only one request is ever in flight.
#[derive(Debug)]
pub struct PostcodesClient<T> {
    pipeline: RequestPipeline<T>,
}

impl PostcodesClient<ReqwestTransport> {
    /// Create a client that talks to the API over HTTP.
    pub fn from_config(config: &ClientConfig) -> Result<Self, PostcodesError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: HttpTransport> PostcodesClient<T> {
    /// Create a client on top of any transport.
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            pipeline: RequestPipeline::new(transport, config.base_url.as_str()),
        }
    }

    /// Look up a single postcode.
    pub async fn lookup(&mut self, postcode: &str) -> Result<Record, PostcodesError> {
        let postcode = Postcode::parse(postcode)?;
        let response = self.get(&format!("{POSTCODES_END}/{postcode}"), Params::new()).await?;
        into_record(response)
    }

    /// Look up several postcodes in one request.
    ///
    /// Records come back in the order of `postcodes`, one per input. A
    /// postcode the API does not know gives an empty record in its slot.
    pub async fn lookup_bulk<S: AsRef<str>>(
        &mut self,
        postcodes: &[S],
    ) -> Result<Vec<Record>, PostcodesError> {
        let inputs = postcodes.len();
        check_bulk_size(inputs)?;
        let postcodes = postcodes
            .iter()
            .map(|p| Postcode::parse(p.as_ref()).map(|p| Value::String(p.as_str().to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let mut payload = Params::new();
        payload.insert("postcodes".to_string(), Value::Array(postcodes));
        let response = self.post(POSTCODES_END, payload).await?;

        bulk_items(&response, inputs)?
            .into_iter()
            .map(|item| -> Result<Record, PostcodesError> {
                match item.get_optional_sub_response("result")? {
                    Some(result) => into_record(result),
                    None => Ok(Record::new()),
                }
            })
            .collect()
    }

    /// Postcodes near a point, nearest first. Empty when there are none.
    pub async fn lookup_lat_lon(
        &mut self,
        coordinate: Coordinate,
    ) -> Result<Vec<Record>, PostcodesError> {
        check_coordinate(coordinate)?;
        let mut params = Params::new();
        params.insert("lon".to_string(), Value::from(coordinate.longitude));
        params.insert("lat".to_string(), Value::from(coordinate.latitude));

        let response = self.get(POSTCODES_END, params).await?;
        records(&response)
    }

    /// Nearby postcodes for several points in one request, one list per
    /// point in input order.
    pub async fn lookup_bulk_lat_lon(
        &mut self,
        coordinates: &[Coordinate],
    ) -> Result<Vec<Vec<Record>>, PostcodesError> {
        check_bulk_size(coordinates.len())?;
        for coordinate in coordinates {
            check_coordinate(*coordinate)?;
        }
        let geolocations = coordinates
            .iter()
            .map(|c| json!({"longitude": c.longitude, "latitude": c.latitude}))
            .collect();

        let mut payload = Params::new();
        payload.insert("geolocations".to_string(), Value::Array(geolocations));
        let response = self.post(POSTCODES_END, payload).await?;

        bulk_items(&response, coordinates.len())?
            .into_iter()
            .map(|item| -> Result<Vec<Record>, PostcodesError> {
                match item.get_optional_sub_response("result")? {
                    Some(result) => records(&result),
                    None => Ok(Vec::new()),
                }
            })
            .collect()
    }

    /// Ask the API whether a postcode exists.
    pub async fn is_valid(&mut self, postcode: &str) -> Result<bool, PostcodesError> {
        let postcode = Postcode::parse(postcode)?;
        let response = self
            .get(&format!("{POSTCODES_END}/{postcode}/validate"), Params::new())
            .await?;
        Ok(response.get_boolean("result")?)
    }

    /// Postcodes closest to the given one.
    pub async fn nearest(&mut self, postcode: &str) -> Result<Vec<Record>, PostcodesError> {
        let postcode = Postcode::parse(postcode)?;
        let response = self
            .get(&format!("{POSTCODES_END}/{postcode}/nearest"), Params::new())
            .await?;
        records(&response)
    }

    /// Complete a partial postcode.
    ///
    /// `limit` must be between 0 and [`BULK_LIMIT`]; zero is passed through
    /// and leaves the choice to the API.
    pub async fn autocomplete(
        &mut self,
        postcode: &str,
        limit: i64,
    ) -> Result<Vec<String>, PostcodesError> {
        if !(0..=BULK_LIMIT as i64).contains(&limit) {
            return Err(PostcodesError::Validation(format!(
                "autocomplete limit must be between 0 and {BULK_LIMIT}, got {limit}"
            )));
        }
        let prefix = PostcodePrefix::parse(postcode)?;

        let mut params = Params::new();
        params.insert("limit".to_string(), Value::from(limit));
        let response = self
            .get(&format!("{POSTCODES_END}/{prefix}/autocomplete"), params)
            .await?;
        strings(&response)
    }

    /// A random postcode record.
    pub async fn random(&mut self) -> Result<Record, PostcodesError> {
        let response = self.get(RANDOM_POSTCODES_END, Params::new()).await?;
        into_record(response)
    }

    /// Great-circle distance in kilometres between two postcodes.
    ///
    /// Both postcodes are resolved with a single bulk lookup.
    pub async fn distance(&mut self, from: &str, to: &str) -> Result<f64, PostcodesError> {
        let records = self.lookup_bulk(&[from, to]).await?;
        let [first, second] = records.as_slice() else {
            return Err(ResponseError::KeyNotFound {
                key: Key::Index(records.len()),
            }
            .into());
        };

        let start = coordinate_of(first)?;
        let end = coordinate_of(second)?;
        let km = haversine_km(start, end);
        debug!(from, to, km, "computed distance");
        Ok(km)
    }

    /// Look up an outward code (the part before the space).
    pub async fn lookup_outcode(&mut self, outcode: &str) -> Result<Record, PostcodesError> {
        let outcode = Outcode::parse(outcode)?;
        let response = self
            .get(&format!("{OUTCODES_END}/{outcode}"), Params::new())
            .await?;
        into_record(response)
    }

    pub fn pipeline(&self) -> &RequestPipeline<T> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut RequestPipeline<T> {
        &mut self.pipeline
    }

    /// Close the transport and hand it back.
    pub fn close(self) -> T {
        let mut transport = self.pipeline.into_transport();
        transport.close();
        transport
    }

    async fn get(&mut self, endpoint: &str, params: Params) -> Result<Response, PostcodesError> {
        self.pipeline.request(endpoint, &params, Method::Get).await
    }

    async fn post(&mut self, endpoint: &str, payload: Params) -> Result<Response, PostcodesError> {
        self.pipeline.request(endpoint, &payload, Method::Post).await
    }
}

fn check_bulk_size(len: usize) -> Result<(), PostcodesError> {
    if len > BULK_LIMIT {
        return Err(PostcodesError::Validation(format!(
            "bulk requests take at most {BULK_LIMIT} items, got {len}"
        )));
    }
    Ok(())
}

/// A response that must be a single map.
fn into_record(response: Response) -> Result<Record, PostcodesError> {
    match response.into_value() {
        Value::Object(record) => Ok(record),
        other => Err(ResponseError::TypeMismatch {
            key: Key::from("result"),
            expected: ValueKind::Map,
            found: ValueKind::of(&other),
        }
        .into()),
    }
}

/// The elements of a list response; a boxed `null` result is empty.
fn list_items(response: &Response) -> Result<&[Value], ResponseError> {
    let found = match response.as_value() {
        Value::Array(items) => return Ok(items.as_slice()),
        Value::Object(members) if members.len() == 1 => match members.get("result") {
            Some(Value::Null) => return Ok(&[]),
            Some(boxed) => ValueKind::of(boxed),
            None => ValueKind::Map,
        },
        other => ValueKind::of(other),
    };
    Err(ResponseError::TypeMismatch {
        key: Key::from("result"),
        expected: ValueKind::List,
        found,
    })
}

/// The `{query, result}` items of a bulk response, exactly one per input.
fn bulk_items(response: &Response, inputs: usize) -> Result<Vec<Response>, PostcodesError> {
    let items = list_items(response)?;
    if items.len() < inputs {
        return Err(ResponseError::KeyNotFound {
            key: Key::Index(items.len()),
        }
        .into());
    }
    if items.len() > inputs {
        return Err(PostcodesError::MalformedResponse {
            message: format!("{} results for {inputs} queries", items.len()),
            body: None,
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(members) => Ok(Response::from(members.clone())),
            other => Err(PostcodesError::from(mismatch_at(i, ValueKind::Map, other))),
        })
        .collect()
}

/// Every element of a list response, each of which must be a map.
fn records(response: &Response) -> Result<Vec<Record>, PostcodesError> {
    list_items(response)?
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(record) => Ok(record.clone()),
            other => Err(PostcodesError::from(mismatch_at(i, ValueKind::Map, other))),
        })
        .collect()
}

/// Every element of a list response, each of which must be a string.
fn strings(response: &Response) -> Result<Vec<String>, PostcodesError> {
    list_items(response)?
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(PostcodesError::from(mismatch_at(i, ValueKind::String, other))),
        })
        .collect()
}

fn mismatch_at(index: usize, expected: ValueKind, found: &Value) -> ResponseError {
    ResponseError::TypeMismatch {
        key: Key::Index(index),
        expected,
        found: ValueKind::of(found),
    }
}

fn check_coordinate(coordinate: Coordinate) -> Result<(), PostcodesError> {
    if !coordinate.is_finite() {
        return Err(PostcodesError::Validation(format!(
            "coordinates must be finite, got lon {} lat {}",
            coordinate.longitude, coordinate.latitude
        )));
    }
    Ok(())
}

/// Latitude and longitude of a record.
///
/// The API has sent coordinates both as numbers and as numeric strings,
/// so strings that parse as `f64` are accepted here.
fn coordinate_of(record: &Record) -> Result<Coordinate, ResponseError> {
    let response = Response::from(record.clone());
    Ok(Coordinate::new(
        coerced_number(&response, "longitude")?,
        coerced_number(&response, "latitude")?,
    ))
}

fn coerced_number(response: &Response, key: &str) -> Result<f64, ResponseError> {
    match response.get_number(key) {
        Err(err @ ResponseError::TypeMismatch { .. }) => response
            .get_string(key)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or(err),
        other => other,
    }
}
