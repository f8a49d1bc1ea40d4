use crate::settings::ConfigError;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64, STANDARD_NO_PAD};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 9200;
const DEFAULT_SCHEME: &str = "http";
const DEFAULT_USERNAME: &str = "elastic";

#[derive(Clone, PartialEq, Eq)]
pub enum IndexAuth {
    ApiKey(String),
    Basic { username: String, password: String },
}

// Keeps secrets out of logs.
impl std::fmt::Debug for IndexAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexAuth::ApiKey(_) => f.write_str("ApiKey(..)"),
            IndexAuth::Basic { username, .. } => write!(f, "Basic {{ username: {username:?}, .. }}"),
        }
    }
}

/// Where the index lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCredentials {
    pub endpoint: String,
    pub auth: IndexAuth,
    pub verify_certs: bool,
}

impl IndexCredentials {
    /// Resolve credentials from the process environment.
    ///
    /// Cloud mode (`ELASTIC_CLOUD_ID`) requires `ELASTIC_API_KEY`. Host mode
    /// reads `ELASTIC_HOST`, `ELASTIC_PORT`, `HTTP_SCHEME` and authenticates
    /// with `ELASTIC_API_KEY` or `ELASTIC_USERNAME` + `ELASTIC_PASSWORD`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let verify_certs = match var("ELASTIC_VERIFY_CERTS") {
            None => true,
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::InvalidVar {
                name: "ELASTIC_VERIFY_CERTS",
                value,
                reason: "expected true or false".into(),
            })?,
        };

        if let Some(cloud_id) = var("ELASTIC_CLOUD_ID") {
            let api_key = var("ELASTIC_API_KEY").ok_or(ConfigError::MissingVar("ELASTIC_API_KEY"))?;
            return Ok(Self {
                endpoint: decode_cloud_id(&cloud_id)?,
                auth: IndexAuth::ApiKey(api_key),
                verify_certs,
            });
        }

        let host = var("ELASTIC_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let host = strip_scheme(&host).trim_end_matches('/').to_owned();
        let port = match var("ELASTIC_PORT") {
            None => DEFAULT_PORT,
            Some(value) => value.parse::<u16>().map_err(|e| ConfigError::InvalidVar {
                name: "ELASTIC_PORT",
                value,
                reason: e.to_string(),
            })?,
        };
        let scheme = var("HTTP_SCHEME").unwrap_or_else(|| DEFAULT_SCHEME.to_owned());
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::InvalidVar {
                name: "HTTP_SCHEME",
                value: scheme,
                reason: "expected http or https".into(),
            });
        }

        let auth = match var("ELASTIC_API_KEY") {
            Some(api_key) => IndexAuth::ApiKey(api_key),
            None => IndexAuth::Basic {
                username: var("ELASTIC_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_owned()),
                password: var("ELASTIC_PASSWORD").ok_or(ConfigError::MissingVar("ELASTIC_PASSWORD"))?,
            },
        };

        Ok(Self {
            endpoint: format!("{scheme}://{host}:{port}"),
            auth,
            verify_certs,
        })
    }
}

/// Elastic Cloud id → Elasticsearch endpoint.
///
/// Format: `<label>:<base64("<host>[:<port>]$<es_uuid>$<kibana_uuid>")>`.
pub fn decode_cloud_id(cloud_id: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidVar {
        name: "ELASTIC_CLOUD_ID",
        value: cloud_id.to_owned(),
        reason: reason.to_owned(),
    };

    let encoded = cloud_id.rsplit_once(':').map_or(cloud_id, |(_, encoded)| encoded);
    let decoded = BASE64
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .map_err(|_| invalid("not base64"))?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid("not utf-8"))?;

    let mut parts = decoded.split('$');
    let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(|| invalid("missing host"))?;
    let es_uuid = parts.next().filter(|u| !u.is_empty()).ok_or_else(|| invalid("missing cluster id"))?;

    Ok(match host.split_once(':') {
        Some((domain, port)) => format!("https://{es_uuid}.{domain}:{port}"),
        None => format!("https://{es_uuid}.{host}"),
    })
}

fn strip_scheme(host: &str) -> &str {
    host.strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<IndexCredentials, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        IndexCredentials::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn host_mode_defaults() {
        let creds = resolve(&[("ELASTIC_PASSWORD", "changeme")]).unwrap();
        assert_eq!(creds.endpoint, "http://localhost:9200");
        assert_eq!(
            creds.auth,
            IndexAuth::Basic { username: "elastic".into(), password: "changeme".into() }
        );
        assert!(creds.verify_certs);
    }

    #[test]
    fn host_with_scheme_prefix_is_normalized() {
        let creds = resolve(&[
            ("ELASTIC_HOST", "https://search.internal/"),
            ("ELASTIC_PORT", "9243"),
            ("HTTP_SCHEME", "https"),
            ("ELASTIC_API_KEY", "key"),
            ("ELASTIC_VERIFY_CERTS", "false"),
        ])
        .unwrap();
        assert_eq!(creds.endpoint, "https://search.internal:9243");
        assert_eq!(creds.auth, IndexAuth::ApiKey("key".into()));
        assert!(!creds.verify_certs);
    }

    #[test]
    fn missing_password_is_fatal() {
        assert_eq!(resolve(&[]), Err(ConfigError::MissingVar("ELASTIC_PASSWORD")));
        assert_eq!(
            resolve(&[("ELASTIC_PASSWORD", "   ")]),
            Err(ConfigError::MissingVar("ELASTIC_PASSWORD"))
        );
    }

    #[test]
    fn bad_port_is_fatal() {
        let err = resolve(&[("ELASTIC_PORT", "ninety"), ("ELASTIC_PASSWORD", "x")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "ELASTIC_PORT", .. }));
    }

    #[test]
    fn cloud_mode_requires_api_key() {
        let cloud_id = format!("prod:{}", BASE64.encode("us-east-1.aws.found.io$abc123$def456"));
        assert_eq!(
            resolve(&[("ELASTIC_CLOUD_ID", &cloud_id)]),
            Err(ConfigError::MissingVar("ELASTIC_API_KEY"))
        );

        let creds = resolve(&[("ELASTIC_CLOUD_ID", &cloud_id), ("ELASTIC_API_KEY", "key")]).unwrap();
        assert_eq!(creds.endpoint, "https://abc123.us-east-1.aws.found.io");
    }

    #[test]
    fn cloud_id_port_is_kept() {
        let cloud_id = format!("label:{}", BASE64.encode("eu-west-1.aws.found.io:9243$es1$kb1"));
        assert_eq!(decode_cloud_id(&cloud_id).unwrap(), "https://es1.eu-west-1.aws.found.io:9243");
    }

    #[test]
    fn garbage_cloud_id_is_rejected() {
        assert!(decode_cloud_id("label:%%%").is_err());
        assert!(decode_cloud_id(&format!("x:{}", BASE64.encode("only-host"))).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let auth = IndexAuth::Basic { username: "elastic".into(), password: "hunter2".into() };
        assert!(!format!("{auth:?}").contains("hunter2"));
        assert!(!format!("{:?}", IndexAuth::ApiKey("secret".into())).contains("secret"));
    }
}
