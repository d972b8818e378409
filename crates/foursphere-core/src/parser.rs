//! Response parsing and normalization.
//!
//! Converts the nested `venues/explore` document into flat `Venue` records.
//! Parsing is all-or-nothing: one venue missing a required field fails the
//! whole batch. Optional sub-objects (photos, hours, categories) fall back to
//! defaults when absent or incomplete.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::api::response::{ApiEnvelope, ApiItem, ApiPhotos, Scalar, SUCCESS_CODE};
use crate::api::RawResponse;
use crate::models::{Coordinate, OpenStatus, Venue};

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Response did not report success (meta.code = {0})")]
    Unsuccessful(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: String, value: String },

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

fn missing(field: impl Into<String>) -> ParseError {
    ParseError::MissingField(field.into())
}

/// Parse a venue search response into venues, in response order.
pub fn parse(raw: &RawResponse) -> Result<Vec<Venue>, ParseError> {
    let envelope =
        ApiEnvelope::deserialize(raw.as_value()).map_err(|e| ParseError::Shape(e.to_string()))?;

    let code = envelope
        .meta
        .and_then(|meta| meta.code)
        .map(|code| code.to_text())
        .ok_or_else(|| missing("meta.code"))?;
    if code != SUCCESS_CODE {
        return Err(ParseError::Unsuccessful(code));
    }

    let groups = envelope
        .response
        .and_then(|response| response.groups)
        .ok_or_else(|| missing("response.groups"))?;

    // Only the first group carries the recommended venues
    let first = groups
        .into_iter()
        .next()
        .ok_or_else(|| missing("response.groups[0]"))?;
    let items = first
        .items
        .ok_or_else(|| missing("response.groups[0].items"))?;

    let venues = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| venue_from_item(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = venues.len(), "Parsed venue response");
    Ok(venues)
}

fn venue_from_item(index: usize, item: ApiItem) -> Result<Venue, ParseError> {
    let path = format!("response.groups[0].items[{}].venue", index);
    let venue = item.venue.ok_or_else(|| missing(path.clone()))?;

    let id = venue
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing(format!("{}.id", path)))?;
    let name = venue.name.ok_or_else(|| missing(format!("{}.name", path)))?;

    let location = venue
        .location
        .ok_or_else(|| missing(format!("{}.location", path)))?;
    let latitude = degrees(location.lat.as_ref(), &format!("{}.location.lat", path))?;
    let longitude = degrees(location.lng.as_ref(), &format!("{}.location.lng", path))?;
    if !Coordinate::new(latitude, longitude).is_valid() {
        return Err(ParseError::InvalidField {
            field: format!("{}.location", path),
            value: format!("{},{}", latitude, longitude),
        });
    }

    // First category in the list is the primary one
    let category = venue
        .categories
        .and_then(|categories| categories.into_iter().next())
        .and_then(|c| c.short_name.or(c.name))
        .unwrap_or_default();

    let photo_url = venue.photos.as_ref().and_then(|photos| photo_url(&id, photos));

    let open_status = match venue.hours {
        Some(hours) => OpenStatus::from_flag(hours.is_open.as_ref().and_then(Scalar::as_bool)),
        None => OpenStatus::Unknown,
    };

    Ok(Venue {
        id,
        name,
        category,
        latitude,
        longitude,
        photo_url,
        open_status,
        distance_miles: None,
    })
}

fn degrees(value: Option<&Scalar>, field: &str) -> Result<f64, ParseError> {
    let value = value.ok_or_else(|| missing(field))?;
    value.as_f64().ok_or_else(|| ParseError::InvalidField {
        field: field.to_string(),
        value: value.to_text(),
    })
}

/// Build `prefix + width + "x" + height + suffix` from the first photo of
/// the first photo group. Only attempted when the reported count is positive.
fn photo_url(venue_id: &str, photos: &ApiPhotos) -> Option<String> {
    let count = photos.count.as_ref().and_then(Scalar::as_i64).unwrap_or(0);
    if count <= 0 {
        return None;
    }

    let photo = photos
        .groups
        .as_deref()
        .and_then(|groups| groups.first())
        .and_then(|group| group.items.as_deref()?.first());
    let Some(photo) = photo else {
        debug!(venue_id, count, "Photo count is positive but no photo item was sent");
        return None;
    };

    match (&photo.prefix, &photo.width, &photo.height, &photo.suffix) {
        (Some(prefix), Some(width), Some(height), Some(suffix)) => Some(format!(
            "{}{}x{}{}",
            prefix.replace('\\', ""),
            width.to_text(),
            height.to_text(),
            suffix.replace('\\', "")
        )),
        _ => {
            debug!(venue_id, "Incomplete photo object, skipping photo");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn explore(items: Value) -> RawResponse {
        RawResponse::from_value(json!({
            "meta": {"code": 200},
            "response": {"groups": [{"type": "Recommended Places", "items": items}]}
        }))
    }

    fn venue_json(id: &str, name: &str, lat: Value, lng: Value) -> Value {
        json!({
            "venue": {
                "id": id,
                "name": name,
                "location": {"lat": lat, "lng": lng},
                "categories": [{"name": "Pizza Place", "shortName": "Pizza"}],
                "photos": {"count": 0, "groups": []}
            }
        })
    }

    #[test]
    fn test_parse_photo_scenario() {
        let raw = RawResponse::from_value(json!({
            "meta": {"code": "200"},
            "response": {"groups": [{"items": [
                {"venue": {
                    "id": "a1", "name": "No Photo Diner",
                    "location": {"lat": "40.1", "lng": "-74.1"},
                    "categories": [{"shortName": "Diner"}],
                    "photos": {"count": 0, "groups": []}
                }},
                {"venue": {
                    "id": "b2", "name": "Photo Cafe",
                    "location": {"lat": "40.2", "lng": "-74.2"},
                    "categories": [{"shortName": "Café"}],
                    "photos": {"count": 1, "groups": [{"items": [{
                        "prefix": "https://irs0.4sqi.net/img/general/",
                        "suffix": "/abc.jpg",
                        "width": 100,
                        "height": 100
                    }]}]}
                }}
            ]}]}
        }));

        let venues = parse(&raw).expect("parse response");
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].id, "a1");
        assert_eq!(venues[0].photo_url, None);
        assert_eq!(venues[1].id, "b2");
        assert_eq!(
            venues[1].photo_url.as_deref(),
            Some("https://irs0.4sqi.net/img/general/100x100/abc.jpg")
        );
        assert_eq!(venues[1].category, "Café");
        assert_eq!(venues[0].latitude, 40.1);
        assert_eq!(venues[1].longitude, -74.2);
    }

    #[test]
    fn test_parse_numeric_coordinates() {
        let venues = parse(&explore(json!([venue_json("v1", "Joe's", json!(40.5), json!(-74.25))])))
            .expect("parse response");
        assert_eq!(venues[0].coordinate(), Coordinate::new(40.5, -74.25));
        assert_eq!(venues[0].category, "Pizza");
        assert_eq!(venues[0].distance_miles, None);
    }

    #[test]
    fn test_parse_missing_id_fails_whole_batch() {
        let mut broken = venue_json("x", "Broken", json!("1"), json!("1"));
        broken["venue"]
            .as_object_mut()
            .expect("venue object")
            .remove("id");
        let raw = explore(json!([venue_json("ok", "Fine", json!("1"), json!("1")), broken]));

        assert_eq!(
            parse(&raw),
            Err(ParseError::MissingField(
                "response.groups[0].items[1].venue.id".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_missing_location_fails() {
        let raw = explore(json!([{"venue": {"id": "v1", "name": "Nowhere"}}]));
        assert_eq!(
            parse(&raw),
            Err(ParseError::MissingField(
                "response.groups[0].items[0].venue.location".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_unparseable_latitude() {
        let raw = explore(json!([venue_json("v1", "Bad", json!("north"), json!("1"))]));
        assert!(matches!(parse(&raw), Err(ParseError::InvalidField { .. })));
    }

    #[test]
    fn test_parse_out_of_range_coordinate() {
        let raw = explore(json!([venue_json("v1", "Bad", json!(123.0), json!(1.0))]));
        assert!(matches!(parse(&raw), Err(ParseError::InvalidField { .. })));
    }

    #[test]
    fn test_parse_unsuccessful_code() {
        let raw = RawResponse::from_value(json!({"meta": {"code": 500}, "response": {}}));
        assert_eq!(parse(&raw), Err(ParseError::Unsuccessful("500".to_string())));
    }

    #[test]
    fn test_parse_missing_meta() {
        let raw = RawResponse::from_value(json!({"response": {"groups": []}}));
        assert_eq!(parse(&raw), Err(ParseError::MissingField("meta.code".to_string())));
    }

    #[test]
    fn test_parse_empty_groups() {
        let raw = RawResponse::from_value(json!({"meta": {"code": 200}, "response": {"groups": []}}));
        assert_eq!(
            parse(&raw),
            Err(ParseError::MissingField("response.groups[0]".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_items_is_empty_batch() {
        assert_eq!(parse(&explore(json!([]))), Ok(Vec::new()));
    }

    #[test]
    fn test_parse_wrong_shape() {
        let raw = RawResponse::from_value(json!({"meta": {"code": 200}, "response": {"groups": "nope"}}));
        assert!(matches!(parse(&raw), Err(ParseError::Shape(_))));
    }

    #[test]
    fn test_parse_hours() {
        let mut open = venue_json("open", "Open", json!(1), json!(1));
        open["venue"]["hours"] = json!({"status": "Open until 10 PM", "isOpen": true});
        let mut closed = venue_json("closed", "Closed", json!(1), json!(1));
        closed["venue"]["hours"] = json!({"isOpen": "false"});
        let mut vague = venue_json("vague", "Vague", json!(1), json!(1));
        vague["venue"]["hours"] = json!({"status": "Likely open"});
        let none = venue_json("none", "None", json!(1), json!(1));

        let venues = parse(&explore(json!([open, closed, vague, none]))).expect("parse response");
        let statuses: Vec<OpenStatus> = venues.iter().map(|v| v.open_status).collect();
        assert_eq!(
            statuses,
            vec![
                OpenStatus::Open,
                OpenStatus::Closed,
                OpenStatus::Unknown,
                OpenStatus::Unknown
            ]
        );
    }

    #[test]
    fn test_parse_category_fallbacks() {
        let mut long_name = venue_json("a", "A", json!(1), json!(1));
        long_name["venue"]["categories"] = json!([{"name": "Thai Restaurant"}]);
        let mut empty = venue_json("b", "B", json!(1), json!(1));
        empty["venue"]["categories"] = json!([]);
        let mut absent = venue_json("c", "C", json!(1), json!(1));
        absent["venue"].as_object_mut().expect("venue object").remove("categories");

        let venues = parse(&explore(json!([long_name, empty, absent]))).expect("parse response");
        assert_eq!(venues[0].category, "Thai Restaurant");
        assert_eq!(venues[1].category, "");
        assert_eq!(venues[2].category, "");
    }

    #[test]
    fn test_null_optional_lists_default() {
        let mut no_categories = venue_json("a", "A", json!(1), json!(1));
        no_categories["venue"]["categories"] = Value::Null;
        let mut no_photo_groups = venue_json("b", "B", json!(2), json!(2));
        no_photo_groups["venue"]["photos"] = json!({"count": 0, "groups": null});
        let mut no_photo_items = venue_json("c", "C", json!(3), json!(3));
        no_photo_items["venue"]["photos"] = json!({"count": 2, "groups": [{"items": null}]});
        let mut no_hours = venue_json("d", "D", json!(4), json!(4));
        no_hours["venue"]["hours"] = Value::Null;
        no_hours["venue"]["photos"] = Value::Null;

        let venues = parse(&explore(json!([
            no_categories,
            no_photo_groups,
            no_photo_items,
            no_hours
        ])))
        .expect("null optional fields should not fail the batch");
        assert_eq!(venues.len(), 4);
        assert_eq!(venues[0].category, "");
        assert_eq!(venues[1].photo_url, None);
        assert_eq!(venues[2].photo_url, None);
        assert_eq!(venues[3].open_status, OpenStatus::Unknown);
        assert_eq!(venues[3].photo_url, None);
    }

    #[test]
    fn test_photo_count_without_groups_defaults_to_none() {
        let mut item = venue_json("v1", "V", json!(1), json!(1));
        item["venue"]["photos"] = json!({"count": 3, "groups": []});
        let venues = parse(&explore(json!([item]))).expect("parse response");
        assert_eq!(venues[0].photo_url, None);
    }

    #[test]
    fn test_photo_url_strips_backslashes() {
        let mut item = venue_json("v1", "V", json!(1), json!(1));
        item["venue"]["photos"] = json!({"count": "1", "groups": [{"items": [{
            "prefix": "https:\\/\\/img.example\\/p\\/",
            "suffix": "\\/x.jpg",
            "width": "300",
            "height": "200"
        }]}]});
        let venues = parse(&explore(json!([item]))).expect("parse response");
        assert_eq!(
            venues[0].photo_url.as_deref(),
            Some("https://img.example/p/300x200/x.jpg")
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = explore(json!([
            venue_json("v1", "One", json!(1), json!(1)),
            venue_json("v2", "Two", json!(2), json!(2))
        ]));
        assert_eq!(parse(&raw), parse(&raw));
    }
}
