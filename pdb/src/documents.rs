//! Source documents
//!
//! Line records name their source file with a [`PdbSource`]. Many line blocks share a file, so
//! the reader keeps one canonical [`Document`] per path in a [`DocumentRegistry`]. The GUIDs that
//! describe a file are classified into small enums; GUIDs that this crate does not know are kept
//! as `Other`.

use crate::function::PdbSource;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;
use uuid::{Uuid, uuid};

macro_rules! guid_enum {
    (
        $(#[$outer:meta])*
        $ty:ident {
            $( $(#[$a:meta])* $variant:ident = $guid:literal, )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
        pub enum $ty {
            /// Nil GUID.
            #[default]
            Unknown,
            $( $(#[$a])* #[allow(missing_docs)] $variant, )*
            /// A GUID with no named variant.
            Other(Uuid),
        }

        impl $ty {
            /// Classifies a GUID.
            pub fn from_guid(guid: Uuid) -> Self {
                $(
                    if guid == uuid!($guid) {
                        return Self::$variant;
                    }
                )*
                if guid.is_nil() { Self::Unknown } else { Self::Other(guid) }
            }

            /// The GUID for this value. `Unknown` maps to the nil GUID.
            pub fn to_guid(self) -> Uuid {
                match self {
                    Self::Unknown => Uuid::nil(),
                    $( Self::$variant => uuid!($guid), )*
                    Self::Other(guid) => guid,
                }
            }
        }
    }
}

guid_enum! {
    /// Source language of a document.
    DocumentLanguage {
        C = "63a08714-fc37-11d2-904c-00c04fa302a1",
        Cpp = "3a12d0b7-c26c-11d0-b442-00a0244a1dd2",
        CSharp = "3f5162f8-07c6-11d3-9053-00c04fa302a1",
        Basic = "3a12d0b8-c26c-11d0-b442-00a0244a1dd2",
        Java = "3a12d0b4-c26c-11d0-b442-00a0244a1dd2",
        Cobol = "af046cd1-d0e1-11d2-977c-00a0c9b4d50c",
        Pascal = "af046cd2-d0e1-11d2-977c-00a0c9b4d50c",
        Cil = "af046cd3-d0e1-11d2-977c-00a0c9b4d50c",
        JScript = "3a12d0b6-c26c-11d0-b442-00a0244a1dd2",
        Smc = "0d9b9f7b-6611-11d3-bd2a-0000f80849bd",
        /// Managed C++
        MCpp = "4b35fde8-07c6-11d3-9053-00c04fa302a1",
        FSharp = "ab4f38c9-b6e6-43ba-be3b-58080b2ccce3",
    }
}

guid_enum! {
    /// Vendor of the compiler that produced a document's language.
    DocumentLanguageVendor {
        Microsoft = "994b45c4-e6e9-11d2-903f-00c04fa302a1",
    }
}

guid_enum! {
    /// Kind of document.
    DocumentType {
        Text = "5a869d0b-6611-11d3-bd2a-0000f80849bd",
    }
}

guid_enum! {
    /// Algorithm used for a document's checksum.
    DocumentHashAlgorithm {
        Md5 = "406ea660-64cf-4c82-b6f0-42d48172a799",
        Sha1 = "ff1816ec-aa5e-4d10-87f7-6f4963833460",
        Sha256 = "8829d00f-11b8-4213-878b-770e8597ac16",
    }
}

/// A source file referenced by sequence points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    /// Path of the file. Two documents with the same path are the same document.
    pub url: String,
    #[allow(missing_docs)]
    pub language: DocumentLanguage,
    #[allow(missing_docs)]
    pub language_vendor: DocumentLanguageVendor,
    #[allow(missing_docs)]
    pub document_type: DocumentType,
    #[allow(missing_docs)]
    pub hash_algorithm: DocumentHashAlgorithm,
    /// Checksum of the file contents. Empty if the store has none.
    pub hash: Vec<u8>,
}

impl Document {
    /// Builds a document from a store record.
    pub fn from_source(source: &PdbSource) -> Self {
        Self {
            url: source.name.clone(),
            language: DocumentLanguage::from_guid(source.language),
            language_vendor: DocumentLanguageVendor::from_guid(source.vendor),
            document_type: DocumentType::from_guid(source.doctype),
            hash_algorithm: DocumentHashAlgorithm::from_guid(source.checksum_algorithm),
            hash: source.checksum.clone(),
        }
    }

    /// Converts back to a store record.
    pub fn to_source(&self) -> PdbSource {
        PdbSource {
            name: self.url.clone(),
            language: self.language.to_guid(),
            vendor: self.language_vendor.to_guid(),
            doctype: self.document_type.to_guid(),
            checksum_algorithm: self.hash_algorithm.to_guid(),
            checksum: self.hash.clone(),
        }
    }
}

/// Canonical documents, keyed by path.
///
/// The first record seen for a path decides the document's attributes.
#[derive(Default)]
pub struct DocumentRegistry {
    documents: HashMap<String, Rc<Document>>,
}

impl DocumentRegistry {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document for `source.name`, creating it on first use.
    pub fn get_or_insert(&mut self, source: &PdbSource) -> Rc<Document> {
        if let Some(doc) = self.documents.get(&source.name) {
            return Rc::clone(doc);
        }

        trace!(url = source.name.as_str(), "new document");
        let doc = Rc::new(Document::from_source(source));
        self.documents.insert(source.name.clone(), Rc::clone(&doc));
        doc
    }

    /// Finds a document by path.
    pub fn get(&self, url: &str) -> Option<&Rc<Document>> {
        self.documents.get(url)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests;
