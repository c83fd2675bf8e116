//! conversions between [`Headers`] and the [`http`] crate's [`HeaderMap`]

use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{InvalidHeaderName, InvalidHeaderValue},
};
use smol_str::SmolStr;
use std::fmt;

use crate::Headers;

/// Error returned when converting between [`Headers`] and [`HeaderMap`] fails.
#[derive(Debug)]
pub struct HeaderMapConversionError {
    name: SmolStr,
    kind: HeaderMapConversionErrorKind,
}

#[derive(Debug)]
enum HeaderMapConversionErrorKind {
    InvalidName(InvalidHeaderName),
    InvalidValue(InvalidHeaderValue),
    NonUtf8Value(std::str::Utf8Error),
}

impl HeaderMapConversionError {
    fn invalid_name(name: &str, err: InvalidHeaderName) -> Self {
        Self {
            name: SmolStr::new(name),
            kind: HeaderMapConversionErrorKind::InvalidName(err),
        }
    }

    fn invalid_value(name: &str, err: InvalidHeaderValue) -> Self {
        Self {
            name: SmolStr::new(name),
            kind: HeaderMapConversionErrorKind::InvalidValue(err),
        }
    }

    fn non_utf8_value(name: &str, err: std::str::Utf8Error) -> Self {
        Self {
            name: SmolStr::new(name),
            kind: HeaderMapConversionErrorKind::NonUtf8Value(err),
        }
    }

    /// Name of the header that could not be converted.
    #[must_use]
    pub fn header_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for HeaderMapConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        match &self.kind {
            HeaderMapConversionErrorKind::InvalidName(_) => {
                write!(f, "header map conversion error: invalid header name: {name:?}")
            }
            HeaderMapConversionErrorKind::InvalidValue(_) => {
                write!(f, "header map conversion error: invalid value for header {name:?}")
            }
            HeaderMapConversionErrorKind::NonUtf8Value(_) => {
                write!(f, "header map conversion error: non utf-8 value for header {name:?}")
            }
        }
    }
}

impl std::error::Error for HeaderMapConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            HeaderMapConversionErrorKind::InvalidName(err) => Some(err),
            HeaderMapConversionErrorKind::InvalidValue(err) => Some(err),
            HeaderMapConversionErrorKind::NonUtf8Value(err) => Some(err),
        }
    }
}

fn header_pair(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), HeaderMapConversionError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| HeaderMapConversionError::invalid_name(name, err))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|err| HeaderMapConversionError::invalid_value(name, err))?;
    Ok((header_name, header_value))
}

/// Canonical headers are converted first. Raw headers are only added
/// when no header with the same (lower-cased) name exists yet,
/// as [`HeaderMap`] cannot preserve casing.
impl TryFrom<&Headers> for HeaderMap {
    type Error = HeaderMapConversionError;

    fn try_from(headers: &Headers) -> Result<Self, Self::Error> {
        let mut map = Self::with_capacity(headers.all_items().len());

        for (key, value) in headers.items() {
            let (name, value) = header_pair(key, value)?;
            map.insert(name, value);
        }

        for (key, value) in headers.raw_items() {
            let (name, value) = header_pair(key, value)?;
            if map.contains_key(&name) {
                tracing::trace!(
                    header.name = %key,
                    "raw header dropped: header map already contains {name}"
                );
                continue;
            }
            map.insert(name, value);
        }

        Ok(map)
    }
}

/// Every header is added as a canonical header.
/// For headers with multiple values only the last value is kept.
impl TryFrom<&HeaderMap> for Headers {
    type Error = HeaderMapConversionError;

    fn try_from(map: &HeaderMap) -> Result<Self, Self::Error> {
        let mut headers = Self::with_capacity(map.keys_len());

        for name in map.keys() {
            let values = map.get_all(name);
            let Some(value) = values.iter().next_back() else {
                continue;
            };

            let dropped = values.iter().count() - 1;
            if dropped > 0 {
                tracing::trace!(
                    header.name = %name,
                    "multi-valued header: dropped {dropped} value(s), last value kept"
                );
            }

            let value = std::str::from_utf8(value.as_bytes())
                .map_err(|err| HeaderMapConversionError::non_utf8_value(name.as_str(), err))?;
            headers.set(name.as_str(), value);
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_headers_into_header_map() {
        let headers = Headers::new()
            .with("Content-Type", "application/json")
            .with_raw("X-Sig", "abc")
            .with_raw("CONTENT-TYPE", "text/plain");

        let map = HeaderMap::try_from(&headers).unwrap();
        assert_eq!(2, map.len());
        assert_eq!("application/json", map["content-type"]);
        assert_eq!("abc", map["x-sig"]);
    }

    #[test]
    fn test_empty_headers_into_header_map() {
        let map = HeaderMap::try_from(&Headers::new()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_headers_into_header_map_invalid_name() {
        let headers = Headers::new().with("not a header", "foo");
        let err = HeaderMap::try_from(&headers).unwrap_err();
        assert_eq!("not a header", err.header_name());
        assert!(err.to_string().contains("invalid header name"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_headers_into_header_map_invalid_value() {
        let headers = Headers::new().with_raw("X-Multi-Line", "a\nb");
        let err = HeaderMap::try_from(&headers).unwrap_err();
        assert_eq!("X-Multi-Line", err.header_name());
        assert!(err.to_string().contains("invalid value"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_header_map_into_headers() {
        let mut map = HeaderMap::new();
        map.insert("rpc-caller", HeaderValue::from_static("billing"));
        map.append("accept", HeaderValue::from_static("text/plain"));
        map.append("accept", HeaderValue::from_static("application/json"));

        let headers = Headers::try_from(&map).unwrap();
        assert_eq!(2, headers.len());
        assert_eq!(Some("billing"), headers.get("Rpc-Caller"));
        assert_eq!(Some("application/json"), headers.get("accept"));
        assert!(headers.raw_items().is_empty());
        assert!(logs_contain("multi-valued header: dropped 1 value(s)"));
    }

    #[test]
    fn test_header_map_into_headers_non_utf8() {
        let mut map = HeaderMap::new();
        map.insert("x-bin", HeaderValue::from_bytes(b"\xff\xfe").unwrap());

        let err = Headers::try_from(&map).unwrap_err();
        assert_eq!("x-bin", err.header_name());
        assert!(err.to_string().contains("non utf-8"));
    }
}
