//! Image catalog endpoints under `/images`.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{resolve_all, Interface, Query};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::id::IdRef;
use crate::multipart::Form;
use crate::response::Payload;
use crate::types::{Image, ImageRecord, PreviewImage};

const BASE: &str = "images";

/// NSFW filter for catalog queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Nsfw {
    #[default]
    Exclude,
    Include,
    /// Only NSFW images.
    Only,
}

impl fmt::Display for Nsfw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Nsfw::Exclude => "false",
            Nsfw::Include => "true",
            Nsfw::Only => "only",
        })
    }
}

/// What to upload: a remote URL, a local path, or an already open file.
#[derive(Debug)]
pub enum Upload {
    Url(String),
    Path(PathBuf),
    File { file: File, file_name: String },
}

impl Upload {
    pub fn file(file: File, file_name: impl Into<String>) -> Self {
        Upload::File {
            file,
            file_name: file_name.into(),
        }
    }
}

/// Strings with a host are URLs; anything else is a local path.
impl From<&str> for Upload {
    fn from(resource: &str) -> Self {
        match Url::parse(resource) {
            Ok(url) if url.host().is_some() => Upload::Url(resource.to_string()),
            _ => Upload::Path(PathBuf::from(resource)),
        }
    }
}

impl From<String> for Upload {
    fn from(resource: String) -> Self {
        Upload::from(resource.as_str())
    }
}

impl From<&Path> for Upload {
    fn from(path: &Path) -> Self {
        Upload::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Upload {
    fn from(path: PathBuf) -> Self {
        Upload::Path(path)
    }
}

/// Metadata sent along with an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub hidden: bool,
    pub nsfw: bool,
    pub tags: Vec<String>,
    pub source: Option<String>,
}

impl UploadOptions {
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn tags<'a, I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<IdRef<'a>>,
    {
        self.tags = resolve_all(tags);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UrlUpload<'a> {
    url: &'a str,
    base_type: &'a str,
    hidden: bool,
    tags: &'a [String],
    nsfw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

/// Parameters for `types`.
#[derive(Debug, Clone, Default)]
pub struct TypesQuery {
    pub hidden: bool,
    pub nsfw: Nsfw,
    /// Also return one preview image per type.
    pub preview: bool,
}

/// Image type names, plus previews when requested.
#[derive(Debug, Clone, Default)]
pub struct ImageTypes {
    pub types: Vec<String>,
    pub preview: Vec<PreviewImage>,
}

/// Selection filter shared by `random` and `list`.
#[derive(Debug, Clone, Default)]
pub struct ImageQuery {
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub hidden: bool,
    pub nsfw: Nsfw,
    pub file_type: Option<String>,
}

impl ImageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn tags<'a, I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<IdRef<'a>>,
    {
        self.tags = resolve_all(tags);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn nsfw(mut self, nsfw: Nsfw) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    fn to_query(&self) -> Query {
        Query::new()
            .push_opt("type", self.kind.as_deref())
            .push_list("tags", &self.tags)
            .push("hidden", self.hidden)
            .push("nsfw", self.nsfw)
            .push_opt("filetype", self.file_type.as_deref())
    }
}

/// Parameters for `list`: a filter, a page, and optionally one uploader.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: ImageQuery,
    pub page: u32,
    pub account: Option<String>,
}

/// Client for the image catalog (`/images`).
#[derive(Debug, Clone)]
pub struct Images {
    interface: Interface,
}

impl Images {
    /// Standalone client; validates `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_interface(Interface::new(config, "Images")?))
    }

    pub fn from_interface(interface: Interface) -> Self {
        Self { interface }
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Upload an image from a URL, a local path, or an open file.
    ///
    /// Local paths are opened and read before anything is sent; failures
    /// surface as `ApiError::FileAccess`.
    pub fn upload(
        &self,
        resource: impl Into<Upload>,
        kind: &str,
        options: &UploadOptions,
    ) -> Result<Image> {
        let request = match resource.into() {
            Upload::Url(url) => {
                let body = UrlUpload {
                    url: &url,
                    base_type: kind,
                    hidden: options.hidden,
                    tags: &options.tags,
                    nsfw: options.nsfw,
                    source: options.source.as_deref(),
                };
                self.interface
                    .build_json(HttpMethod::Post, &[BASE, "upload"], &body)?
            }
            Upload::Path(path) => {
                let file = File::open(&path).map_err(|e| ApiError::file_access(&path, e))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".to_string());
                let form = upload_form(file, &path, &file_name, kind, options)?;
                self.interface.build_form(&[BASE, "upload"], form)?
            }
            Upload::File { file, file_name } => {
                let form = upload_form(file, Path::new(&file_name), &file_name, kind, options)?;
                self.interface.build_form(&[BASE, "upload"], form)?
            }
        };
        let payload = self.interface.call(request)?;
        self.image_from(payload)
    }

    pub fn types(&self, query: &TypesQuery) -> Result<ImageTypes> {
        let q = Query::new()
            .push("hidden", query.hidden)
            .push("nsfw", query.nsfw)
            .push("preview", query.preview);
        let request = self.interface.build_get(&[BASE, "types"], &q)?;
        let mut body = self.interface.call(request)?.into_json()?;
        let types = take_field(&mut body, "types")?;
        let preview = match body.get_mut("preview").map(Value::take) {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(ApiError::deserialization)?,
        };
        Ok(ImageTypes { types, preview })
    }

    /// Tag names available to this account.
    pub fn tags(&self, hidden: bool, nsfw: Nsfw) -> Result<Vec<String>> {
        let q = Query::new().push("hidden", hidden).push("nsfw", nsfw);
        let request = self.interface.build_get(&[BASE, "tags"], &q)?;
        self.interface.call(request)?.field("tags")
    }

    pub fn random(&self, query: &ImageQuery) -> Result<Image> {
        let request = self.interface.build_get(&[BASE, "random"], &query.to_query())?;
        let payload = self.interface.call(request)?;
        self.image_from(payload)
    }

    pub fn image<'a>(&self, id: impl Into<IdRef<'a>>) -> Result<Image> {
        let id = id.into();
        let request = self
            .interface
            .build_get(&[BASE, "info", id.as_str()], &Query::new())?;
        let payload = self.interface.call(request)?;
        self.image_from(payload)
    }

    /// Delete an image; returns the record as it was deleted.
    pub fn delete_image<'a>(&self, id: impl Into<IdRef<'a>>) -> Result<Image> {
        let id = id.into();
        let request = self.interface.build_delete(&[BASE, "info", id.as_str()])?;
        let payload = self.interface.call(request)?;
        self.image_from(payload)
    }

    pub fn add_tags<'a, 'b, I, T>(&self, image: impl Into<IdRef<'a>>, tags: I) -> Result<Image>
    where
        I: IntoIterator<Item = T>,
        T: Into<IdRef<'b>>,
    {
        self.change_tags(HttpMethod::Post, image.into(), resolve_all(tags))
    }

    pub fn remove_tags<'a, 'b, I, T>(&self, image: impl Into<IdRef<'a>>, tags: I) -> Result<Image>
    where
        I: IntoIterator<Item = T>,
        T: Into<IdRef<'b>>,
    {
        self.change_tags(HttpMethod::Delete, image.into(), resolve_all(tags))
    }

    fn change_tags(&self, method: HttpMethod, image: IdRef<'_>, tags: Vec<String>) -> Result<Image> {
        let body = serde_json::json!({ "tags": tags });
        let request = self
            .interface
            .build_json(method, &[BASE, "info", image.as_str()], &body)?;
        let payload = self.interface.call(request)?;
        self.image_from(payload)
    }

    /// One page of images, optionally restricted to one uploader.
    pub fn list(&self, query: &ListQuery) -> Result<Vec<Image>> {
        let q = query.filter.to_query().push("page", query.page);
        let request = match &query.account {
            Some(account) => self
                .interface
                .build_get(&[BASE, "list", account.as_str()], &q)?,
            None => self.interface.build_get(&[BASE, "list"], &q)?,
        };
        let body = self.interface.call(request)?.into_json()?;
        let records: Vec<ImageRecord> = match body {
            Value::Array(items) => serde_json::from_value(Value::Array(items)),
            mut object => serde_json::from_value(
                object.get_mut("images").map(Value::take).unwrap_or_default(),
            ),
        }
        .map_err(ApiError::deserialization)?;
        Ok(records
            .into_iter()
            .map(|record| Image::new(record, self.clone()))
            .collect())
    }

    /// The image record of a response, whether wrapped in `image`/`file`
    /// or spread over the top level.
    fn image_from(&self, payload: Payload) -> Result<Image> {
        let mut body = payload.into_json()?;
        let record = ["image", "file"]
            .iter()
            .find_map(|key| body.get_mut(*key).filter(|v| v.is_object()).map(Value::take))
            .unwrap_or(body);
        let record: ImageRecord = serde_json::from_value(record).map_err(ApiError::deserialization)?;
        Ok(Image::new(record, self.clone()))
    }
}

fn take_field<T: serde::de::DeserializeOwned>(body: &mut Value, key: &str) -> Result<T> {
    let value = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ApiError::Deserialization(format!("missing field `{key}`")))?;
    serde_json::from_value(value).map_err(ApiError::deserialization)
}

fn upload_form(
    mut file: File,
    path: &Path,
    file_name: &str,
    kind: &str,
    options: &UploadOptions,
) -> Result<Form> {
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| ApiError::file_access(path, e))?;
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();

    let mut form = Form::new()
        .file("file", file_name, mime.essence_str(), &data)
        .text("baseType", kind)
        .text("hidden", &options.hidden.to_string())
        .text("nsfw", &options.nsfw.to_string());
    if !options.tags.is_empty() {
        form = form.text("tags", &options.tags.join(","));
    }
    if let Some(source) = &options.source {
        form = form.text("source", source);
    }
    Ok(form)
}
