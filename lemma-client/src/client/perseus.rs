use super::LemmaLookup;
use crate::error::LookupError;
use ::utils::surf_logging::SurfLogging;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use surf::http::Method;
use surf::{Client, Request, StatusCode, Url};

/// Latin morphology service of the Perseus Digital Library.
pub const DEFAULT_ENDPOINT: &str = "http://www.perseus.tufts.edu/hopper/xmlmorph?lang=la&lookup=";

const ROOT_ELEMENT: &str = "analyses";

#[derive(Debug, Deserialize)]
struct Analyses {
    #[serde(rename = "analysis", default)]
    analyses: Vec<Analysis>,
}

#[derive(Debug, Deserialize)]
struct Analysis {
    #[serde(default)]
    lemma: String,
}

/// Looks words up against an `xmlmorph`-style endpoint.
///
/// The word is percent-encoded and appended to the endpoint, which is
/// expected to end in the lookup query parameter.
#[derive(Clone)]
pub struct PerseusClient {
    http: Client,
    endpoint: String,
}

impl Default for PerseusClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl PerseusClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, word: &str) -> String {
        format!("{}{}", self.endpoint, urlencoding::encode(word))
    }
}

#[async_trait]
impl LemmaLookup for PerseusClient {
    async fn lookup(&self, word: &str) -> Result<Option<String>, LookupError> {
        log::debug!("lemmatizing word '{}'", word);

        let http_error = |message: String| LookupError::Http {
            word: word.to_string(),
            message,
        };

        let url = Url::parse(&self.request_url(word)).map_err(|err| http_error(err.to_string()))?;
        let request: Request = Request::builder(Method::Get, url)
            .header("Connection", "close")
            .build();

        let mut response = self
            .http
            .send(request)
            .await
            .map_err(|err| http_error(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::Ok {
            return Err(LookupError::Status {
                word: word.to_string(),
                status: u16::from(status),
            });
        }

        let body = response
            .body_string()
            .await
            .map_err(|err| http_error(err.to_string()))?;

        parse_analyses(&body).map_err(|message| {
            log::debug!("unparseable response for '{}':\n{}", word, body);
            LookupError::Malformed {
                word: word.to_string(),
                message,
            }
        })
    }
}

/// Extracts the first analysis' lemma from an `<analyses>` document.
fn parse_analyses(body: &str) -> Result<Option<String>, String> {
    let root = root_element(body)?;
    if root != ROOT_ELEMENT {
        return Err(format!(
            "expected element <{}> but found <{}>",
            ROOT_ELEMENT, root
        ));
    }

    let parsed: Analyses = quick_xml::de::from_str(body).map_err(|err| err.to_string())?;
    Ok(parsed
        .analyses
        .into_iter()
        .next()
        .map(|analysis| analysis.lemma)
        .filter(|lemma| !lemma.is_empty()))
}

fn root_element(body: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Ok(String::from_utf8_lossy(element.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => return Err("document has no root element".to_string()),
            Ok(_) => continue,
            Err(err) => return Err(err.to_string()),
        }
    }
}
