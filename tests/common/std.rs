use std::{
    fs::{create_dir_all, remove_file, File},
    path::PathBuf,
};

pub fn out_path(file_name: &str) -> PathBuf {
    let out_dir = std::env::temp_dir().join("storezip");
    if !out_dir.exists() {
        create_dir_all(&out_dir).unwrap_or_else(|error| {
            panic!("creating dir {:?} failed, because {:?}", out_dir, error);
        })
    }

    out_dir.join(file_name)
}

pub fn create_new_clean_file(file_name: &str) -> (File, PathBuf) {
    let out_path = out_path(file_name);

    if out_path.exists() {
        remove_file(&out_path).unwrap_or_else(|error| {
            panic!("deleting file {:?} failed, because {:?}", &out_path, error);
        });
    }
    let file = File::create(&out_path).unwrap_or_else(|error| {
        panic!("creating file {:?} failed, because {:?}", &out_path, error);
    });

    (file, out_path)
}
