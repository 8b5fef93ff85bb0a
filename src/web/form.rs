//! Multipart bodies for the image-bearing endpoints.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use sea_orm::prelude::Date;

use crate::errors::FolioError;
use crate::files::Upload;

/// Text fields and file parts of a multipart request, read fully into memory.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl Form {
    pub async fn read(mut multipart: Multipart) -> Result<Self, FolioError> {
        let mut form = Form::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| FolioError::Validation(format!("Invalid multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        FolioError::Validation(format!("Invalid file `{name}`: {e}"))
                    })?;
                    // browsers send an empty part when no file was picked
                    if bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        Upload {
                            file_name: Some(file_name),
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        FolioError::Validation(format!("Invalid field `{name}`: {e}"))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Non-blank text field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> Result<String, FolioError> {
        self.text(name)
            .ok_or_else(|| FolioError::Validation(format!("Field `{name}` is required")))
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, FolioError> {
        self.text(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| FolioError::Validation(format!("Invalid value for `{name}`")))
            })
            .transpose()
    }

    pub fn date(&self, name: &str) -> Result<Option<Date>, FolioError> {
        self.parse::<Date>(name)
    }

    pub fn file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let f = form(&[("name", "  "), ("code", " ACME ")]);
        assert_eq!(f.text("name"), None);
        assert_eq!(f.text("code").as_deref(), Some("ACME"));
        assert!(f.required("name").is_err());
    }

    #[test]
    fn test_typed_fields() {
        let f = form(&[("is_active", "false"), ("level", "x"), ("started_at", "2020-01-31")]);
        assert_eq!(f.parse::<bool>("is_active").unwrap(), Some(false));
        assert!(f.parse::<i32>("level").is_err());
        assert_eq!(
            f.date("started_at").unwrap(),
            Date::from_ymd_opt(2020, 1, 31)
        );
    }
}
