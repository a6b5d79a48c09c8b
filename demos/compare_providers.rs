use chrono::{Duration, Utc};
use forecast_arbiter::{
    open_meteo, ArbiterError, ForecastAnalyzer, ForecastSource, Location, ProvidersConfig,
    WeatherModel, WeatherParam,
};

fn main() -> Result<(), ArbiterError> {
    let config = ProvidersConfig::from_env();
    let forecast_service = config.forecast_service()?;
    println!(
        "Registered providers: {:?}",
        forecast_service.external_service_names()
    );

    let location = Location::new("Berlin", "13.405", "52.52");
    let params = [
        WeatherParam::Temperature,
        WeatherParam::WindSpeed,
        WeatherParam::WindDirection,
    ];
    let yesterday = Utc::now() - Duration::days(1);

    let mut analyzer = ForecastAnalyzer::from_sources()
        .service(&forecast_service)
        .sources(&[
            ForecastSource::new(open_meteo::PROVIDER_NAME, WeatherModel::Default),
            ForecastSource::new(open_meteo::PROVIDER_NAME, WeatherModel::Icon),
        ])
        .params(&params)
        .location(&location)
        .target_timestamp(yesterday)
        .call()?;

    for forecast in analyzer.forecasts() {
        println!("--- {} model ---", forecast.weather_model());
        println!("{:?}", forecast.data().tail(Some(3)));
    }

    let weather_service = config.weather_service()?;
    let weather_log = weather_service.get_weather_for_location(
        &location,
        yesterday - Duration::hours(12),
        yesterday + Duration::hours(12),
        &params,
    )?;
    println!("Observed by {}:", weather_log.source());
    println!("{:?}", weather_log.data().tail(Some(3)));

    analyzer.analyze_held(&weather_log)?;
    for score in analyzer.scores() {
        println!(
            "{:>12} {:>8}: MAE {:.2} over {} values",
            score.provider.as_deref().unwrap_or("?"),
            score.model,
            score.mean_absolute_error,
            score.samples
        );
    }
    println!("Winner: {}", analyzer.get_winning_weather_model()?);

    let repository = config.repository()?;
    for forecast in analyzer.forecasts() {
        let saved = repository.save_forecast(forecast)?;
        println!(
            "Saved {} forecast as id {:?} in {}",
            saved.weather_model(),
            saved.id(),
            repository.base_dir().display()
        );
    }

    Ok(())
}
