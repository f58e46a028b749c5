//! Request body extractors that answer with the `{code, message}` envelope
//! instead of axum's plain-text rejections.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use axum::Json;
use nanotrade_core::{Money, ValidationError};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// `Json<T>` whose rejection is an [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields and the optional `image` file of a multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    pub image: Option<UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            match file_name {
                Some(file_name) if name == "image" => {
                    let bytes = field.bytes().await?.to_vec();
                    if !bytes.is_empty() {
                        form.image = Some(UploadedFile { file_name, bytes });
                    }
                }
                _ => {
                    let value = field.text().await?;
                    form.fields.entry(name).or_default().push(value);
                }
            }
        }
        Ok(form)
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut form = FormData::default();
        for (name, value) in pairs {
            form.fields
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        form
    }

    /// First non-blank value of a field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> ApiResult<String> {
        self.text(name).ok_or_else(|| {
            ValidationError::Required {
                field: name.to_string(),
            }
            .into()
        })
    }

    /// Every non-blank value of a repeated field.
    pub fn all(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .map(|values| {
                values
                    .iter()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A decimal amount ("1500", "1500.50") in minor units.
    pub fn money(&self, name: &str) -> ApiResult<Option<i64>> {
        match self.text(name) {
            Some(raw) => {
                let amount = Money::parse_decimal(&raw).map_err(|e| rename_field(e, name))?;
                Ok(Some(amount.cents()))
            }
            None => Ok(None),
        }
    }

    pub fn integer(&self, name: &str) -> ApiResult<Option<i64>> {
        match self.text(name) {
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                ValidationError::InvalidFormat {
                    field: name.to_string(),
                    reason: "expected a whole number".to_string(),
                }
                .into()
            }),
            None => Ok(None),
        }
    }
}

fn rename_field(err: ValidationError, field: &str) -> ValidationError {
    let field = field.to_string();
    match err {
        ValidationError::Required { .. } => ValidationError::Required { field },
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat { field, reason },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_fields() {
        let form = FormData::from_pairs(&[("price", "1500.5"), ("purchase_price", "abc")]);
        assert_eq!(form.money("price").unwrap(), Some(150_050));
        assert_eq!(form.money("missing").unwrap(), None);

        let err = form.money("purchase_price").unwrap_err();
        assert!(err.message.contains("purchase_price"));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let form = FormData::from_pairs(&[("sku", "  "), ("shops", "a"), ("shops", ""), ("shops", "b")]);
        assert_eq!(form.text("sku"), None);
        assert!(form.required("sku").is_err());
        assert_eq!(form.all("shops"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_integer_field() {
        let form = FormData::from_pairs(&[("reorder_level", "12"), ("bad", "1.5")]);
        assert_eq!(form.integer("reorder_level").unwrap(), Some(12));
        assert!(form.integer("bad").is_err());
    }
}
