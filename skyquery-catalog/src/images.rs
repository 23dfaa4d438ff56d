//! Pan-STARRS image cutouts.
//!
//! Two services are involved. `ps1filenames.py` lists the stacked images
//! covering a position, one per filter. `fitscut.cgi` cuts a region out of
//! one image (grayscale) or combines three into a color composite.
//!
//! Sizes are in PS1 pixels (0.25 arcsec).

use crate::http::build_url;
use crate::ArchiveClient;
use reqwest::Url;
use skyquery_core::{Position, Ps1Filter, QueryError, QueryResult, Table};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// PS1 pixel scale in arcseconds.
pub const PIXEL_SCALE_ARCSEC: f64 = 0.25;

/// Default cutout edge length in pixels (one arcminute).
pub const DEFAULT_SIZE: u32 = 240;

/// Output encoding of a cutout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
    Fits,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Fits => "fits",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            "fits" => Ok(Self::Fits),
            _ => Err(QueryError::invalid_format(s, &["jpg", "png", "fits"])),
        }
    }
}

/// One stacked image covering the requested position.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub filter: Ps1Filter,
    /// Server-side path, passed back to the cutout service.
    pub filename: String,
    pub shortname: Option<String>,
    pub projcell: Option<u32>,
    pub subcell: Option<u32>,
}

/// Parameters for a cutout.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoutRequest {
    pub position: Position,
    /// Edge length of the extracted region, in pixels.
    pub size: u32,
    /// Edge length of the returned image, if it should be resampled.
    pub output_size: Option<u32>,
    pub filters: Vec<Ps1Filter>,
    pub format: ImageFormat,
    /// Combine three filters into one color image.
    pub color: bool,
}

impl CutoutRequest {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            size: DEFAULT_SIZE,
            output_size: None,
            filters: Ps1Filter::ALL.to_vec(),
            format: ImageFormat::Jpg,
            color: false,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn output_size(mut self, output_size: u32) -> Self {
        self.output_size = Some(output_size);
        self
    }

    pub fn filters(mut self, filters: Vec<Ps1Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.color && self.format == ImageFormat::Fits {
            return Err(QueryError::invalid_parameter(
                "format",
                "color images are available only for jpg or png formats",
            ));
        }
        if self.size == 0 {
            return Err(QueryError::invalid_parameter("size", "must be at least 1 pixel"));
        }
        if self.output_size == Some(0) {
            return Err(QueryError::invalid_parameter(
                "output_size",
                "must be at least 1 pixel",
            ));
        }
        if self.filters.is_empty() {
            return Err(QueryError::invalid_parameter("filters", "no filters given"));
        }
        Ok(())
    }
}

/// Build cutout URLs for the listed image files.
///
/// Files are ordered red to blue. In color mode the first, middle and last
/// become the red, green and blue channels and a single URL is returned;
/// otherwise there is one grayscale URL per file.
pub fn cutout_urls(fitscut_url: &str, request: &CutoutRequest, files: &[ImageFile]) -> QueryResult<Vec<Url>> {
    request.validate()?;

    let mut files: Vec<&ImageFile> = files.iter().collect();
    files.sort_by_key(|f| f.filter.red_to_blue_rank());

    let mut params: Vec<(&str, String)> = vec![
        ("ra", request.position.ra_deg.to_string()),
        ("dec", request.position.dec_deg.to_string()),
        ("size", request.size.to_string()),
        ("format", request.format.to_string()),
    ];
    if let Some(output_size) = request.output_size {
        params.push(("output_size", output_size.to_string()));
    }

    if request.color {
        if files.len() < 3 {
            return Err(QueryError::invalid_parameter(
                "filters",
                &format!("color images need three filters, {} available", files.len()),
            ));
        }
        let picks = [files[0], files[files.len() / 2], files[files.len() - 1]];
        for (channel, file) in ["red", "green", "blue"].into_iter().zip(picks) {
            params.push((channel, file.filename.clone()));
        }
        return Ok(vec![build_url(fitscut_url, &params)?]);
    }

    files
        .iter()
        .map(|file| {
            let mut gray = params.clone();
            gray.push(("red", file.filename.clone()));
            build_url(fitscut_url, &gray)
        })
        .collect()
}

fn parse_image_list(text: &str) -> QueryResult<Vec<ImageFile>> {
    let table = Table::from_whitespace(text)?;
    let filters = table.column_str("filter")?;
    let filenames = table.column_str("filename")?;
    let optional = |name: &str, row: usize| table.cell(row, name).map(str::to_string);

    filters
        .iter()
        .zip(&filenames)
        .enumerate()
        .map(|(row, (filter, filename))| -> QueryResult<ImageFile> {
            let filter: Ps1Filter = filter.parse()?;
            Ok(ImageFile {
                filter,
                filename: filename.to_string(),
                shortname: optional("shortname", row),
                projcell: optional("projcell", row).and_then(|s| s.parse().ok()),
                subcell: optional("subcell", row).and_then(|s| s.parse().ok()),
            })
        })
        .collect()
}

impl ArchiveClient {
    /// List the stacked images covering `position`, one per filter.
    pub fn list_images(
        &self,
        position: &Position,
        size: u32,
        filters: &[Ps1Filter],
    ) -> QueryResult<Vec<ImageFile>> {
        if filters.is_empty() {
            return Err(QueryError::invalid_parameter("filters", "no filters given"));
        }
        let url = build_url(
            &self.config().ps1_filenames_url,
            &[
                ("ra", position.ra_deg.to_string()),
                ("dec", position.dec_deg.to_string()),
                ("size", size.to_string()),
                ("format", "fits".to_string()),
                ("filters", Ps1Filter::join(filters)),
            ],
        )?;
        let text = self.get_text(&url)?;
        parse_image_list(&text)
    }

    /// Validate `request`, list the covering images and build cutout URLs.
    ///
    /// Nothing is sent if the request itself is invalid.
    pub fn cutout_urls(&self, request: &CutoutRequest) -> QueryResult<Vec<Url>> {
        request.validate()?;
        let files = self.list_images(&request.position, request.size, &request.filters)?;
        cutout_urls(&self.config().ps1_fitscut_url, request, &files)
    }

    /// Download one cutout.
    pub fn fetch_cutout(&self, url: &Url) -> QueryResult<Vec<u8>> {
        self.get_bytes(url)
    }

    /// Download one cutout to `path`, returning the number of bytes written.
    pub fn download_cutout(&self, url: &Url, path: &Path) -> QueryResult<u64> {
        let bytes = self.fetch_cutout(url)?;
        fs::write(path, &bytes)
            .map_err(|e| QueryError::io(&path.display().to_string(), &e.to_string()))?;
        log::debug!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(bytes.len() as u64)
    }

    /// Fetch a color composite (jpg or png).
    pub fn color_image(&self, request: &CutoutRequest) -> QueryResult<Vec<u8>> {
        let request = request.clone().color(true);
        let urls = self.cutout_urls(&request)?;
        match urls.first() {
            Some(url) => self.fetch_cutout(url),
            None => Err(QueryError::invalid_parameter("filters", "no images cover this position")),
        }
    }

    /// Fetch a grayscale cutout in a single filter.
    pub fn grayscale_image(&self, request: &CutoutRequest, filter: Ps1Filter) -> QueryResult<Vec<u8>> {
        let request = request.clone().color(false).filters(vec![filter]);
        let urls = self.cutout_urls(&request)?;
        match urls.first() {
            Some(url) => self.fetch_cutout(url),
            None => Err(QueryError::invalid_parameter(
                "filters",
                &format!("no {} image covers this position", filter),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FITSCUT: &str = "https://ps1images.stsci.edu/cgi-bin/fitscut.cgi";

    fn file(filter: Ps1Filter) -> ImageFile {
        ImageFile {
            filter,
            filename: format!("/rings.v3.skycell/1519/042/rings.v3.skycell.1519.042.stk.{}.unconv.fits", filter),
            shortname: None,
            projcell: Some(1519),
            subcell: Some(42),
        }
    }

    fn all_files() -> Vec<ImageFile> {
        Ps1Filter::ALL.iter().map(|&f| file(f)).collect()
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_grayscale_urls_red_to_blue() {
        let request = CutoutRequest::new(Position::new(187.706, 12.391)).format(ImageFormat::Fits);
        let urls = cutout_urls(FITSCUT, &request, &all_files()).unwrap();
        assert_eq!(urls.len(), 5);
        let order: String = urls
            .iter()
            .map(|u| param(u, "red").unwrap())
            .map(|name| name.chars().rev().nth(12).unwrap())
            .collect();
        assert_eq!(order, "yzirg");
        assert_eq!(param(&urls[0], "format").as_deref(), Some("fits"));
        assert_eq!(param(&urls[0], "size").as_deref(), Some("240"));
    }

    #[test]
    fn test_color_picks_first_middle_last() {
        let request = CutoutRequest::new(Position::new(187.706, 12.391))
            .color(true)
            .output_size(512);
        let urls = cutout_urls(FITSCUT, &request, &all_files()).unwrap();
        assert_eq!(urls.len(), 1);
        let url = &urls[0];
        assert!(param(url, "red").unwrap().contains(".stk.y."));
        assert!(param(url, "green").unwrap().contains(".stk.i."));
        assert!(param(url, "blue").unwrap().contains(".stk.g."));
        assert_eq!(param(url, "output_size").as_deref(), Some("512"));
    }

    #[test]
    fn test_color_with_three_filters() {
        let files = vec![file(Ps1Filter::G), file(Ps1Filter::R), file(Ps1Filter::I)];
        let request = CutoutRequest::new(Position::new(0.0, 0.0)).color(true);
        let urls = cutout_urls(FITSCUT, &request, &files).unwrap();
        assert!(param(&urls[0], "red").unwrap().contains(".stk.i."));
        assert!(param(&urls[0], "green").unwrap().contains(".stk.r."));
        assert!(param(&urls[0], "blue").unwrap().contains(".stk.g."));
    }

    #[test]
    fn test_color_fits_rejected() {
        let request = CutoutRequest::new(Position::new(0.0, 0.0))
            .color(true)
            .format(ImageFormat::Fits);
        let err = cutout_urls(FITSCUT, &request, &all_files()).unwrap_err();
        assert!(err.to_string().contains("only for jpg or png"));
    }

    #[test]
    fn test_color_needs_three_files() {
        let request = CutoutRequest::new(Position::new(0.0, 0.0)).color(true);
        let files = vec![file(Ps1Filter::G), file(Ps1Filter::R)];
        assert!(cutout_urls(FITSCUT, &request, &files).is_err());
    }

    #[test]
    fn test_zero_size_rejected() {
        let request = CutoutRequest::new(Position::new(0.0, 0.0)).size(0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_parse_image_list() {
        let text = "projcell subcell ra dec filter mjd type filename shortname badflag\n\
            1519 42 187.706 12.391 g 0 stack /a/g.fits g.fits 0\n\
            1519 42 187.706 12.391 z 0 stack /a/z.fits z.fits 0\n";
        let files = parse_image_list(text).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].filter, Ps1Filter::Z);
        assert_eq!(files[1].filename, "/a/z.fits");
        assert_eq!(files[0].shortname.as_deref(), Some("g.fits"));
        assert_eq!(files[0].projcell, Some(1519));
    }

    #[test]
    fn test_parse_image_list_bad_filter() {
        let text = "filter filename\nq /a/q.fits\n";
        assert!(parse_image_list(text).is_err());
    }
}
