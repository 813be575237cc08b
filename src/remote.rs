//! HTTP-backed generation sink
//!
//! Speaks a small JSON protocol with the remote generation service: the
//! composite goes out base64-encoded together with the prompt and the
//! requested aspect/size, one base64 image comes back. Transport errors,
//! non-success statuses, and malformed payloads all surface as
//! [`Error::Generation`]; the sink never retries.

use std::time::Duration;

use base64::Engine as Base64Engine;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::assets::AssetKind;
use crate::error::{Error, Result};
use crate::sink::{GeneratedImage, GenerationRequest, GenerationSink};
use crate::StudioConfig;

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    prompt: String,
    aspect_ratio: &'a str,
    image_size: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Generation sink backed by an HTTP endpoint.
pub struct HttpSink {
    client: Client,
    endpoint: url::Url,
}

impl HttpSink {
    pub fn new(config: &StudioConfig) -> Result<Self> {
        let raw = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("remote sink requires an endpoint".into()))?;
        let endpoint = url::Url::parse(raw)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", raw, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    fn post(&self, body: &WireRequest<'_>) -> Result<GeneratedImage> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .map_err(|e| Error::Generation(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = resp.status();
        let wire: WireResponse = resp
            .json()
            .map_err(|e| Error::Generation(format!("malformed response: {}", e)))?;

        if let Some(message) = wire.error {
            return Err(Error::Generation(message));
        }
        if !status.is_success() {
            return Err(Error::Generation(format!("endpoint returned {}", status)));
        }
        let image = wire
            .image
            .ok_or_else(|| Error::Generation("no image data found in response".into()))?;
        let png_data = base64::engine::general_purpose::STANDARD
            .decode(image.as_bytes())
            .map_err(|e| Error::Generation(format!("image payload is not base64: {}", e)))?;
        Ok(GeneratedImage { png_data })
    }
}

impl GenerationSink for HttpSink {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let instruction = if request.instruction.trim().is_empty() {
            "Apply realistic lighting and materials."
        } else {
            request.instruction.as_str()
        };
        let prompt = format!(
            "Input: a rough design composite of a product with logos placed on it. \
             Task: transform it into a photorealistic product mockup. {} \
             Keep every logo in the exact position, scale, and rotation shown. \
             Make the logos interact with the surface material (warping, texture, \
             lighting) and keep lighting and shadows consistent. \
             Output only the resulting image.",
            instruction
        );
        let body = WireRequest {
            image: Some(
                base64::engine::general_purpose::STANDARD.encode(&request.png_data),
            ),
            prompt,
            aspect_ratio: &request.aspect,
            image_size: &request.tier,
        };
        self.post(&body)
    }

    fn generate_asset(&self, prompt: &str, kind: AssetKind) -> Result<GeneratedImage> {
        let prompt = match kind {
            AssetKind::Logo => format!(
                "A high-quality, professional vector-style logo design of a {}. \
                 Isolated on a pure white background. Minimalist and clean, \
                 single distinct logo.",
                prompt
            ),
            AssetKind::Product => format!(
                "Professional studio product photography of a single {}. Front \
                 view, isolated on a neutral background. High resolution, \
                 photorealistic, single object only.",
                prompt
            ),
        };
        let body = WireRequest {
            image: None,
            prompt,
            aspect_ratio: "1:1",
            image_size: "1K",
        };
        self.post(&body)
    }
}
