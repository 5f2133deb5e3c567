//! Field projection: raw revision → redaction-aware output record

pub mod comment;
pub mod metadata;
pub mod record;
pub mod thumb;

use std::sync::Arc;

use crate::model::{Entity, Revision};
use crate::props::{Prop, PropSet};

pub use comment::{CommentRenderer, EscapingRenderer};
pub use metadata::{flatten_metadata, MetadataEntry, MetadataList, MetadataValue};
pub use record::{
    AuthorFields, CommentFields, ContentFields, Redactable, RevisionRecord, SizeFields,
    ThumbFields, ThumbOutcome, UrlFields,
};
pub use thumb::{PathScaler, Scale, ThumbError, Thumbnail, ThumbnailScaler};

/// Converts revisions into output records for a requested property set
#[derive(Clone)]
pub struct FieldProjector {
    renderer: Arc<dyn CommentRenderer>,
    scaler: Arc<dyn ThumbnailScaler>,
}

impl FieldProjector {
    pub fn new(renderer: Arc<dyn CommentRenderer>, scaler: Arc<dyn ThumbnailScaler>) -> Self {
        Self { renderer, scaler }
    }

    /// Escaping comment renderer and a [`PathScaler`] rooted at `thumb_base_url`.
    pub fn with_defaults(thumb_base_url: &str) -> Self {
        Self::new(
            Arc::new(EscapingRenderer),
            Arc::new(PathScaler::new(thumb_base_url)),
        )
    }

    /// Project one revision.
    ///
    /// `scale` only affects current revisions; archived revisions are never
    /// scaled.
    pub fn project(
        &self,
        entity: &Entity,
        revision: &Revision,
        props: PropSet,
        scale: Option<Scale>,
    ) -> RevisionRecord {
        RevisionRecord {
            // Shown even when the revision is redacted
            timestamp: props
                .contains(Prop::Timestamp)
                .then_some(revision.timestamp),
            author: project_author(revision, props),
            size: project_size(revision, props),
            comment: self.project_comment(entity, revision, props),
            content: self.project_content(entity, revision, props, scale),
        }
    }

    fn project_comment(
        &self,
        entity: &Entity,
        revision: &Revision,
        props: PropSet,
    ) -> Option<Redactable<CommentFields>> {
        if !props.contains_any(&[Prop::Comment, Prop::ParsedComment]) {
            return None;
        }
        if revision.is_comment_hidden() {
            return Some(Redactable::Hidden);
        }
        Some(Redactable::Visible(CommentFields {
            comment: props
                .contains(Prop::Comment)
                .then(|| revision.comment.clone()),
            parsedcomment: props
                .contains(Prop::ParsedComment)
                .then(|| self.renderer.render(&revision.comment, entity)),
        }))
    }

    fn project_content(
        &self,
        entity: &Entity,
        revision: &Revision,
        props: PropSet,
        scale: Option<Scale>,
    ) -> Option<Redactable<ContentFields>> {
        if !props.contains_any(&Prop::CONTENT) {
            return None;
        }
        if revision.is_content_hidden() {
            return Some(Redactable::Hidden);
        }

        let url = props.contains(Prop::Url).then(|| UrlFields {
            url: revision.url.clone(),
            descriptionurl: entity.description_url.clone(),
            thumb: scale
                .filter(|_| revision.is_current())
                .map(|s| self.thumbnail(entity, revision, props, s)),
        });

        Some(Redactable::Visible(ContentFields {
            url,
            sha1: props
                .contains(Prop::Sha1)
                .then(|| hex::encode(&revision.sha1)),
            metadata: props
                .contains(Prop::Metadata)
                .then(|| revision.metadata.as_ref().map(flatten_metadata)),
            mime: props.contains(Prop::Mime).then(|| revision.mime.clone()),
            archivename: if props.contains(Prop::ArchiveName) {
                revision.archive_name().map(str::to_string)
            } else {
                None
            },
            bitdepth: props.contains(Prop::BitDepth).then_some(revision.bit_depth),
        }))
    }

    fn thumbnail(
        &self,
        entity: &Entity,
        revision: &Revision,
        props: PropSet,
        scale: Scale,
    ) -> ThumbOutcome {
        match self.scaler.transform(entity, revision, scale) {
            Ok(thumb) => {
                // Same URL means nothing was resized
                let (width, height) = if thumb.url == revision.url {
                    (revision.width, revision.height)
                } else {
                    (thumb.width, thumb.height)
                };
                ThumbOutcome::Scaled(ThumbFields {
                    url: thumb.url,
                    width,
                    height,
                    mime: props.contains(Prop::ThumbMime).then_some(thumb.mime),
                })
            }
            Err(e) => ThumbOutcome::Error(e.to_string()),
        }
    }
}

impl std::fmt::Debug for FieldProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldProjector").finish_non_exhaustive()
    }
}

fn project_author(revision: &Revision, props: PropSet) -> Option<Redactable<AuthorFields>> {
    if !props.contains_any(&[Prop::User, Prop::UserId]) {
        return None;
    }
    if revision.is_author_hidden() {
        return Some(Redactable::Hidden);
    }
    Some(Redactable::Visible(AuthorFields {
        user: props
            .contains(Prop::User)
            .then(|| revision.author.name.clone()),
        userid: props.contains(Prop::UserId).then_some(revision.author.id),
        anon: revision.author.is_anonymous(),
    }))
}

fn project_size(revision: &Revision, props: PropSet) -> Option<SizeFields> {
    props
        .contains_any(&[Prop::Size, Prop::Dimensions])
        .then(|| SizeFields {
            size: revision.size,
            width: revision.width,
            height: revision.height,
            pagecount: revision.page_count,
        })
}
