//! Модуль для работы с временными файлами
//!
//! Этот модуль содержит менеджер временных файлов с гарантированной
//! очисткой на любом пути выхода.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use crate::error::Result;

/// Менеджер временных файлов
///
/// Все промежуточные артефакты рендеринга создаются внутри одной
/// временной директории и удаляются при завершении. Неудача удаления
/// записывается в журнал и никогда не считается фатальной.
pub struct TempFileManager {
    /// Временная директория
    temp_dir: TempDir,
    /// Список созданных файлов
    files: Vec<PathBuf>,
    /// Нужно ли удалять файлы при завершении
    cleanup: bool,
}

impl TempFileManager {
    /// Создать новый экземпляр TempFileManager
    pub fn new(cleanup: bool) -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;

        Ok(Self {
            temp_dir,
            files: Vec::new(),
            cleanup,
        })
    }

    /// Зарезервировать путь для временного файла
    ///
    /// Имя файла содержит UUID и не конфликтует с другими запусками.
    pub fn create_temp_path(&mut self, prefix: &str, extension: &str) -> PathBuf {
        let file_name = format!("{}_{}.{}", prefix, uuid::Uuid::new_v4(), extension);
        let file_path = self.temp_dir.path().join(file_name);

        self.files.push(file_path.clone());
        file_path
    }

    /// Получить путь к временной директории
    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Очистить временные файлы
    ///
    /// Очистка выполняется по принципу "записать и продолжить": ошибка
    /// удаления одного файла не мешает удалению остальных.
    pub fn cleanup(&mut self) {
        if !self.cleanup {
            return;
        }

        for file in self.files.drain(..) {
            if !file.exists() {
                continue;
            }
            match fs::remove_file(&file) {
                Ok(()) => log::debug!("Deleted temporary file: {}", file.display()),
                Err(e) => log::warn!("Failed to delete temporary file {}: {}", file.display(), e),
            }
        }
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        // Очистка при уничтожении объекта на любом пути выхода
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_unique() {
        let mut manager = TempFileManager::new(true).unwrap();
        let first = manager.create_temp_path("overlay", "png");
        let second = manager.create_temp_path("overlay", "png");
        assert_ne!(first, second);
    }

    #[test]
    fn test_cleanup_removes_created_files() {
        let mut manager = TempFileManager::new(true).unwrap();
        let path = manager.create_temp_path("artifact", "txt");
        fs::write(&path, b"data").unwrap();
        assert!(path.exists());

        manager.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_tolerates_missing_files() {
        let mut manager = TempFileManager::new(true).unwrap();
        let _never_created = manager.create_temp_path("ghost", "txt");
        // Файл не был создан, очистка не должна паниковать или падать
        manager.cleanup();
    }

    #[test]
    fn test_cleanup_disabled_keeps_files() {
        let mut manager = TempFileManager::new(false).unwrap();
        let path = manager.create_temp_path("kept", "txt");
        fs::write(&path, b"data").unwrap();

        manager.cleanup();
        assert!(path.exists());
    }
}
