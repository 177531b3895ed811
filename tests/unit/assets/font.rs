use super::*;

#[test]
fn missing_font_file_is_a_dependency_error() {
    let err = resolve_caption_font(Some(Path::new("no/such/font.ttf"))).unwrap_err();
    assert!(matches!(err, PressPlayError::RenderDependency(_)));
    assert!(err.to_string().contains("no/such/font.ttf"));
}

#[test]
fn non_font_file_is_a_dependency_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bogus.ttf");
    std::fs::write(&path, b"not a font").unwrap();

    let err = resolve_caption_font(Some(&path)).unwrap_err();
    assert!(matches!(err, PressPlayError::RenderDependency(_)));
}

#[test]
fn system_font_resolution_yields_a_named_face_or_dependency_error() {
    match resolve_caption_font(None) {
        Ok(font) => {
            assert!(!font.bytes.is_empty());
            assert!(!font.family.trim().is_empty());
            assert_eq!(font.origin, FontOrigin::System);
        }
        Err(err) => assert!(matches!(err, PressPlayError::RenderDependency(_))),
    }
}
