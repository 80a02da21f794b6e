//! Startup checks for the files the bot cannot run without.

use pixel_core::error::ResourceError;
use pixel_core::music::MusicLibrary;
use std::path::Path;

/// The stinger must exist and have content.
pub fn check_sound(path: &Path) -> Result<(), ResourceError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(_) => Err(ResourceError::SoundMissing(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ResourceError::SoundMissing(path.to_path_buf()))
        }
        Err(e) => Err(ResourceError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Opens the music library and checks the stinger.
pub fn validate(music_folder: &Path, stinger: &Path) -> Result<MusicLibrary, ResourceError> {
    let library = MusicLibrary::open(music_folder)?;
    check_sound(stinger)?;
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        std::fs::create_dir(&music).unwrap();
        std::fs::write(music.join("a.mp3"), b"x").unwrap();
        let stinger = dir.path().join("stinger.mp3");
        std::fs::write(&stinger, b"x").unwrap();

        let library = validate(&music, &stinger).unwrap();
        assert_eq!(library.tracks().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_stinger_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let stinger = dir.path().join("stinger.mp3");
        std::fs::write(&stinger, b"").unwrap();

        let err = check_sound(&stinger).unwrap_err();
        assert!(matches!(err, ResourceError::SoundMissing(_)));
    }

    #[test]
    fn test_absent_stinger_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_sound(&dir.path().join("nope.mp3")).unwrap_err();
        assert!(matches!(err, ResourceError::SoundMissing(_)));
    }

    #[test]
    fn test_stinger_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_sound(dir.path()).unwrap_err();
        assert!(matches!(err, ResourceError::SoundMissing(_)));
    }

    #[test]
    fn test_music_folder_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate(&dir.path().join("missing"), &dir.path().join("s.mp3")).unwrap_err();
        assert!(matches!(err, ResourceError::MusicFolderMissing(_)));
    }
}
