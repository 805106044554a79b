pub mod content;
pub mod settings;

use crate::{Data, Error};

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        content::qotd(),
        content::questionoftheday(),
        settings::setqotdchannel(),
        settings::setqotdhour(),
        settings::setquestionchannel(),
        settings::setquestionhour(),
        settings::qotdsettings(),
    ]
}
