mod bunny;
mod media;

pub use self::{
    bunny::{BunnyStorage, MediaStorage, StorageObject, storage_host},
    media::{
        MediaKind, MediaLibrary, PHOTOS_FOLDER, PROJECTS_FOLDER, PhotoImage, ProjectMedia,
        media_kind,
    },
};
