use crate::constants::{
    CENTRAL_DIRECTORY_ENTRY_BASE_SIZE, END_OF_CENTRAL_DIRECTORY_SIZE, FILE_HEADER_BASE_SIZE,
};

/// Calculate the exact size of a stored archive based on the names and sizes of files.
///
/// The sum saturates at `u64::MAX` instead of overflowing, so absurd inputs give
/// a size that no archive can reach rather than a panic.
///
/// ## Example
///
/// ```
/// use storezip::tools::archive_size;
///
/// assert_eq!(
///     archive_size([
///         ("file1.txt", b"hello\n".len()),
///         ("file2.txt", b"world\n".len()),
///     ]),
///     222,
/// );
/// ```
pub fn archive_size<'a, I: IntoIterator<Item = (&'a str, usize)>>(files: I) -> u64 {
    let headers = (FILE_HEADER_BASE_SIZE + CENTRAL_DIRECTORY_ENTRY_BASE_SIZE) as u64;

    files.into_iter().fold(
        END_OF_CENTRAL_DIRECTORY_SIZE as u64,
        |total, (name, size)| {
            total
                .saturating_add(headers)
                .saturating_add(2 * name.len() as u64)
                .saturating_add(size as u64)
        },
    )
}

#[cfg(test)]
mod test {
    use super::archive_size;
    use crate::{create_zip, ZipEntry};

    #[test]
    fn empty_archive_size() {
        assert_eq!(archive_size([]), 22);
    }

    #[test]
    fn matches_written_archive() {
        let payload = vec![7u8; 1234];
        let entries = [
            ZipEntry::new("a.png", payload.as_slice()),
            ZipEntry::new("photos/été.jpg", b"".as_ref()),
        ];

        let archive = create_zip(&entries).unwrap();

        assert_eq!(
            archive_size(
                entries
                    .iter()
                    .map(|entry| (entry.name.as_ref(), entry.data.len()))
            ),
            archive.len() as u64
        );
    }

    #[test]
    fn huge_sizes_do_not_overflow() {
        let expected = (usize::MAX as u64)
            .checked_add(30 + 46 + 2 + 22)
            .unwrap_or(u64::MAX);
        assert_eq!(archive_size([("a", usize::MAX)]), expected);

        let three = archive_size([("a", usize::MAX), ("b", usize::MAX), ("c", usize::MAX)]);
        assert!(three >= expected);
    }
}
