
mod adapt;
