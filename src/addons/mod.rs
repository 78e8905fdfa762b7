//! The add-on modules.

pub mod auto_playlist;
pub mod bt_audio;
pub mod mcu_temp;
pub mod mp3_player;
