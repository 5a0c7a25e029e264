//! Book forms and their validation rules.
//!
//! # Design
//! Each form is checked against static tables of named rules. A rule pairs
//! a field with one predicate and the message shown when it fails. Text and
//! file rules are separate types, so a table cannot point a text check at a
//! file selection. Every rule runs, so one submission reports all of its
//! problems at once.
//!
//! File predicates other than `ExactlyOne` only look at the first picked
//! file and pass on an empty selection. On the create form the
//! `ExactlyOne` rule reports the missing file; on the update form an empty
//! selection means "keep the current file".
//!
//! A successful `validate` hands back a payload whose types carry what was
//! checked: `NewBook` owns exactly one cover image and one PDF, `BookPatch`
//! owns at most one of each.

use std::fmt;

use thiserror::Error;

use crate::http::{MultipartForm, Upload};
use crate::types::Book;

/// Multipart field names expected by the backend.
pub mod field {
    pub const TITLE: &str = "title";
    pub const GENRE: &str = "genre";
    pub const DESCRIPTION: &str = "description";
    pub const COVER_IMAGE: &str = "coverImage";
    pub const FILE: &str = "file";
}

pub const MAX_COVER_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_BOOK_FILE_BYTES: usize = 50 * 1024 * 1024;
pub const MIN_TEXT_CHARS: usize = 2;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All rules that failed for one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.issues))]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn messages(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.message).collect()
    }

    /// Messages reported for one field.
    pub fn for_field(&self, field: &str) -> Vec<&'static str> {
        self.issues
            .iter()
            .filter(|i| i.field == field)
            .map(|i| i.message)
            .collect()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.issues.iter().any(|i| i.message == message)
    }
}

fn summary(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Title,
    Genre,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileField {
    CoverImage,
    File,
}

impl TextField {
    fn name(self) -> &'static str {
        match self {
            TextField::Title => field::TITLE,
            TextField::Genre => field::GENRE,
            TextField::Description => field::DESCRIPTION,
        }
    }
}

impl FileField {
    fn name(self) -> &'static str {
        match self {
            FileField::CoverImage => field::COVER_IMAGE,
            FileField::File => field::FILE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TextCheck {
    MinChars(usize),
}

impl TextCheck {
    fn passes(self, value: &str) -> bool {
        match self {
            TextCheck::MinChars(min) => value.chars().count() >= min,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FileCheck {
    ExactlyOne,
    MimePrefix(&'static str),
    MimeEquals(&'static str),
    MaxBytes(usize),
}

impl FileCheck {
    fn passes(self, files: &[Upload]) -> bool {
        match self {
            FileCheck::ExactlyOne => files.len() == 1,
            FileCheck::MimePrefix(prefix) => {
                files.first().map_or(true, |f| f.mime_type.starts_with(prefix))
            }
            FileCheck::MimeEquals(mime) => files.first().map_or(true, |f| f.mime_type == mime),
            FileCheck::MaxBytes(max) => files.first().map_or(true, |f| f.len() <= max),
        }
    }
}

/// One named rule. `F` picks the kind of field, `C` a check that only
/// accepts that kind of input.
struct Rule<F, C> {
    field: F,
    check: C,
    message: &'static str,
}

type TextRule = Rule<TextField, TextCheck>;
type FileRule = Rule<FileField, FileCheck>;

const TEXT_RULES: &[TextRule] = &[
    Rule {
        field: TextField::Title,
        check: TextCheck::MinChars(MIN_TEXT_CHARS),
        message: "Title must be at least 2 characters.",
    },
    Rule {
        field: TextField::Genre,
        check: TextCheck::MinChars(MIN_TEXT_CHARS),
        message: "Genre must be at least 2 characters.",
    },
    Rule {
        field: TextField::Description,
        check: TextCheck::MinChars(MIN_TEXT_CHARS),
        message: "Description must be at least 2 characters.",
    },
];

const COVER_IMAGE_RULES: &[FileRule] = &[
    Rule {
        field: FileField::CoverImage,
        check: FileCheck::MimePrefix("image/"),
        message: "Cover image must be an image file",
    },
    Rule {
        field: FileField::CoverImage,
        check: FileCheck::MaxBytes(MAX_COVER_IMAGE_BYTES),
        message: "Cover image must be less than 5MB",
    },
];

const BOOK_FILE_RULES: &[FileRule] = &[
    Rule {
        field: FileField::File,
        check: FileCheck::MimeEquals("application/pdf"),
        message: "Book file must be a PDF",
    },
    Rule {
        field: FileField::File,
        check: FileCheck::MaxBytes(MAX_BOOK_FILE_BYTES),
        message: "Book file must be less than 50MB",
    },
];

const COVER_IMAGE_REQUIRED: FileRule = Rule {
    field: FileField::CoverImage,
    check: FileCheck::ExactlyOne,
    message: "Cover Image is required",
};

const BOOK_FILE_REQUIRED: FileRule = Rule {
    field: FileField::File,
    check: FileCheck::ExactlyOne,
    message: "Book PDF is required",
};

/// Field values shared by the create and update forms.
struct Fields<'a> {
    title: &'a str,
    genre: &'a str,
    description: &'a str,
    cover_image: &'a [Upload],
    file: &'a [Upload],
}

impl Fields<'_> {
    fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Title => self.title,
            TextField::Genre => self.genre,
            TextField::Description => self.description,
        }
    }

    fn files(&self, field: FileField) -> &[Upload] {
        match field {
            FileField::CoverImage => self.cover_image,
            FileField::File => self.file,
        }
    }

    fn check_text(&self, issues: &mut Vec<FieldIssue>, rules: &[TextRule]) {
        issues.extend(
            rules
                .iter()
                .filter(|rule| !rule.check.passes(self.text(rule.field)))
                .map(|rule| FieldIssue {
                    field: rule.field.name(),
                    message: rule.message,
                }),
        );
    }

    fn check_files<'r>(
        &self,
        issues: &mut Vec<FieldIssue>,
        rules: impl IntoIterator<Item = &'r FileRule>,
    ) {
        issues.extend(
            rules
                .into_iter()
                .filter(|rule| !rule.check.passes(self.files(rule.field)))
                .map(|rule| FieldIssue {
                    field: rule.field.name(),
                    message: rule.message,
                }),
        );
    }
}

/// Raw input of the "create book" form. File fields hold whatever the
/// picker returned, possibly nothing or several files.
#[derive(Debug, Clone, Default)]
pub struct CreateBookForm {
    pub title: String,
    pub genre: String,
    pub description: String,
    pub cover_image: Vec<Upload>,
    pub file: Vec<Upload>,
}

impl CreateBookForm {
    pub fn validate(self) -> Result<NewBook, ValidationErrors> {
        let fields = Fields {
            title: &self.title,
            genre: &self.genre,
            description: &self.description,
            cover_image: &self.cover_image,
            file: &self.file,
        };
        let mut issues = Vec::new();
        fields.check_text(&mut issues, TEXT_RULES);
        fields.check_files(
            &mut issues,
            [&COVER_IMAGE_REQUIRED].into_iter().chain(COVER_IMAGE_RULES),
        );
        fields.check_files(
            &mut issues,
            [&BOOK_FILE_REQUIRED].into_iter().chain(BOOK_FILE_RULES),
        );

        let cover_image = single(self.cover_image);
        let file = single(self.file);
        match (issues.is_empty(), cover_image, file) {
            (true, Some(cover_image), Some(file)) => Ok(NewBook {
                title: self.title,
                genre: self.genre,
                description: self.description,
                cover_image,
                file,
            }),
            _ => Err(ValidationErrors { issues }),
        }
    }
}

/// Raw input of the "edit book" form.
#[derive(Debug, Clone, Default)]
pub struct UpdateBookForm {
    pub title: String,
    pub genre: String,
    pub description: String,
    pub cover_image: Vec<Upload>,
    pub file: Vec<Upload>,
}

impl UpdateBookForm {
    /// Prefill from a fetched book. File selections start empty.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            genre: book.genre.clone(),
            description: book.description.clone(),
            cover_image: Vec::new(),
            file: Vec::new(),
        }
    }

    pub fn validate(self) -> Result<BookPatch, ValidationErrors> {
        let fields = Fields {
            title: &self.title,
            genre: &self.genre,
            description: &self.description,
            cover_image: &self.cover_image,
            file: &self.file,
        };
        let mut issues = Vec::new();
        fields.check_text(&mut issues, TEXT_RULES);
        fields.check_files(&mut issues, COVER_IMAGE_RULES.iter().chain(BOOK_FILE_RULES));
        if !issues.is_empty() {
            return Err(ValidationErrors { issues });
        }

        Ok(BookPatch {
            title: self.title,
            genre: self.genre,
            description: self.description,
            cover_image: self.cover_image.into_iter().next(),
            file: self.file.into_iter().next(),
        })
    }
}

fn single(files: Vec<Upload>) -> Option<Upload> {
    let mut iter = files.into_iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// A validated book ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub genre: String,
    pub description: String,
    pub cover_image: Upload,
    pub file: Upload,
}

impl NewBook {
    pub fn to_multipart(&self) -> MultipartForm {
        MultipartForm::new()
            .text(field::TITLE, &self.title)
            .text(field::GENRE, &self.genre)
            .text(field::DESCRIPTION, &self.description)
            .file(field::COVER_IMAGE, self.cover_image.clone())
            .file(field::FILE, self.file.clone())
    }
}

/// A validated update. Files left as `None` are not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPatch {
    pub title: String,
    pub genre: String,
    pub description: String,
    pub cover_image: Option<Upload>,
    pub file: Option<Upload>,
}

impl BookPatch {
    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text(field::TITLE, &self.title)
            .text(field::GENRE, &self.genre)
            .text(field::DESCRIPTION, &self.description);
        if let Some(cover_image) = &self.cover_image {
            form = form.file(field::COVER_IMAGE, cover_image.clone());
        }
        if let Some(file) = &self.file {
            form = form.file(field::FILE, file.clone());
        }
        form
    }
}
