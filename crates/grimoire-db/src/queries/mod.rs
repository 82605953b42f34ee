mod characters;
mod compendium;
mod encounters;
mod users;
