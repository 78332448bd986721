use super::*;

fn csharp(name: &str) -> PdbSource {
    PdbSource {
        name: name.to_string(),
        language: uuid!("3f5162f8-07c6-11d3-9053-00c04fa302a1"),
        vendor: uuid!("994b45c4-e6e9-11d2-903f-00c04fa302a1"),
        doctype: uuid!("5a869d0b-6611-11d3-bd2a-0000f80849bd"),
        checksum_algorithm: uuid!("8829d00f-11b8-4213-878b-770e8597ac16"),
        checksum: vec![0xaa; 32],
    }
}

#[test]
fn classify() {
    let doc = Document::from_source(&csharp("Program.cs"));
    assert_eq!(doc.language, DocumentLanguage::CSharp);
    assert_eq!(doc.language_vendor, DocumentLanguageVendor::Microsoft);
    assert_eq!(doc.document_type, DocumentType::Text);
    assert_eq!(doc.hash_algorithm, DocumentHashAlgorithm::Sha256);
    assert_eq!(doc.hash.len(), 32);
    assert_eq!(doc.to_source(), csharp("Program.cs"));
}

#[test]
fn unknown_guids() {
    let odd = Uuid::from_u128(0x1234);
    assert_eq!(DocumentLanguage::from_guid(odd), DocumentLanguage::Other(odd));
    assert_eq!(DocumentLanguage::Other(odd).to_guid(), odd);
    assert_eq!(DocumentLanguage::from_guid(Uuid::nil()), DocumentLanguage::Unknown);
    assert_eq!(DocumentHashAlgorithm::Unknown.to_guid(), Uuid::nil());
}

#[test]
fn fsharp() {
    let guid = uuid!("ab4f38c9-b6e6-43ba-be3b-58080b2ccce3");
    assert_eq!(DocumentLanguage::from_guid(guid), DocumentLanguage::FSharp);
    assert_eq!(DocumentLanguage::FSharp.to_guid(), guid);
}

#[test]
fn registry_dedups_by_path() {
    let mut reg = DocumentRegistry::new();
    let a = reg.get_or_insert(&csharp("a.cs"));
    let b = reg.get_or_insert(&csharp("b.cs"));

    // A later record for the same path does not change the document.
    let mut other = csharp("a.cs");
    other.language = Uuid::nil();
    let a2 = reg.get_or_insert(&other);

    assert!(Rc::ptr_eq(&a, &a2));
    assert!(!Rc::ptr_eq(&a, &b));
    assert_eq!(a2.language, DocumentLanguage::CSharp);
    assert_eq!(reg.len(), 2);
    assert!(reg.get("b.cs").is_some());
    assert!(reg.get("c.cs").is_none());
}
