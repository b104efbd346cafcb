//! Local-asset resolution port: finds same-origin asset references in the
//! converted Markdown and records the repository-relative paths they would
//! mirror to, without actually downloading them (download is out of scope).

use crate::collaborators::converter::ConversionResult;
use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[derive(Clone, Debug)]
pub struct AssetfulMarkdownDoc {
    pub markdown: String,
    local_assets: Vec<PathBuf>,
}

impl AssetfulMarkdownDoc {
    pub fn local_assets(&self) -> &[PathBuf] {
        &self.local_assets
    }
}

pub trait Resolver {
    fn resolve(
        &self,
        conversion_result: &ConversionResult,
        base_url: &ImUrl,
    ) -> Result<AssetfulMarkdownDoc, ClassifiedError>;
}

static MARKDOWN_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)\s]+)\)").expect("hardcoded regex is valid"));

/// Scans the Markdown image syntax (`![alt](src)`) for same-origin
/// references and maps each to a repository-relative path under the page's
/// own mirror directory.
pub struct LocalAssetResolver;

impl LocalAssetResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalAssetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for LocalAssetResolver {
    fn resolve(
        &self,
        conversion_result: &ConversionResult,
        base_url: &ImUrl,
    ) -> Result<AssetfulMarkdownDoc, ClassifiedError> {
        let mut local_assets = Vec::new();

        for capture in MARKDOWN_IMAGE_RE.captures_iter(&conversion_result.markdown) {
            let src = &capture[1];

            let resolved = match base_url.resolve(src) {
                Ok(resolved) => resolved,
                Err(e) => {
                    return Err(ClassifiedError::recoverable(Cause::ResolveFailure(
                        e.to_string(),
                    )));
                }
            };

            if resolved.host() != base_url.host() {
                continue;
            }

            let asset_path = Path::new(resolved.path().trim_start_matches('/'));
            let page_dir = Path::new(base_url.path().trim_start_matches('/'))
                .parent()
                .unwrap_or_else(|| Path::new(""));

            let relative = pathdiff::diff_paths(asset_path, page_dir).unwrap_or_else(|| asset_path.to_path_buf());
            local_assets.push(relative);
        }

        Ok(AssetfulMarkdownDoc {
            markdown: conversion_result.markdown.clone(),
            local_assets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ImUrl {
        ImUrl::parse("https://example.com/docs/page").unwrap()
    }

    #[test]
    fn test_collects_same_origin_asset() {
        let resolver = LocalAssetResolver::new();
        let result = ConversionResult {
            markdown: "![logo](/assets/logo.png)".to_string(),
        };
        let resolved = resolver.resolve(&result, &base()).unwrap();
        assert_eq!(resolved.local_assets().len(), 1);
        assert_eq!(resolved.local_assets()[0], Path::new("../assets/logo.png"));
    }

    #[test]
    fn test_ignores_cross_origin_asset() {
        let resolver = LocalAssetResolver::new();
        let result = ConversionResult {
            markdown: "![logo](https://cdn.other.com/logo.png)".to_string(),
        };
        let resolved = resolver.resolve(&result, &base()).unwrap();
        assert!(resolved.local_assets().is_empty());
    }

    #[test]
    fn test_no_images_means_no_assets() {
        let resolver = LocalAssetResolver::new();
        let result = ConversionResult {
            markdown: "Just text, no images.".to_string(),
        };
        let resolved = resolver.resolve(&result, &base()).unwrap();
        assert!(resolved.local_assets().is_empty());
    }

    #[test]
    fn test_multiple_assets_counted() {
        let resolver = LocalAssetResolver::new();
        let result = ConversionResult {
            markdown: "![a](/a.png) and ![b](/b.png)".to_string(),
        };
        let resolved = resolver.resolve(&result, &base()).unwrap();
        assert_eq!(resolved.local_assets().len(), 2);
    }
}
