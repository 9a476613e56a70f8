use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SpeedRuns {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Donations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Donors {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Countries {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CountryRegions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    EventId,
    Name,
    Description,
    Image,
    MinimumBid,
    MaximumBid,
    DrawMethod,
    AutoTickets,
    MaxWinners,
    MaxMultiWin,
    RequiresShipping,
    CustomCountryFilter,
    StartRunId,
    EndRunId,
    Starttime,
    Endtime,
    State,
    Provider,
    AcceptEmailSent,
}

#[derive(DeriveIden)]
enum PrizeTickets {
    Table,
    Id,
    DonationId,
    PrizeId,
    Amount,
}

#[derive(DeriveIden)]
enum PrizeWinners {
    Table,
    Id,
    WinnerId,
    PrizeId,
    PendingCount,
    AcceptCount,
    DeclineCount,
    EmailSent,
    AcceptEmailSentCount,
    AcceptDeadline,
    ShippingState,
    ShippingEmailSent,
    TrackingNumber,
    ShippingCost,
    WinnerNotes,
}

#[derive(DeriveIden)]
enum DonorPrizeEntries {
    Table,
    Id,
    DonorId,
    PrizeId,
    Weight,
}

#[derive(DeriveIden)]
enum PrizeAllowedCountries {
    Table,
    Id,
    PrizeId,
    CountryId,
}

#[derive(DeriveIden)]
enum PrizeDisallowedRegions {
    Table,
    Id,
    PrizeId,
    RegionId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Prizes::Name).string().not_null())
                    .col(
                        ColumnDef::new(Prizes::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Prizes::Image)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Prizes::MinimumBid)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("5.00"),
                    )
                    .col(ColumnDef::new(Prizes::MaximumBid).decimal_len(20, 2).null())
                    .col(
                        ColumnDef::new(Prizes::DrawMethod)
                            .string_len(32)
                            .not_null()
                            .default("RANDOM"),
                    )
                    .col(
                        ColumnDef::new(Prizes::AutoTickets)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Prizes::MaxWinners)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Prizes::MaxMultiWin)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Prizes::RequiresShipping)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Prizes::CustomCountryFilter)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Prizes::StartRunId).big_integer().null())
                    .col(ColumnDef::new(Prizes::EndRunId).big_integer().null())
                    .col(
                        ColumnDef::new(Prizes::Starttime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prizes::Endtime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prizes::State)
                            .string_len(32)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Prizes::Provider)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Prizes::AcceptEmailSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_event")
                            .from(Prizes::Table, Prizes::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_start_run")
                            .from(Prizes::Table, Prizes::StartRunId)
                            .to(SpeedRuns::Table, SpeedRuns::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_end_run")
                            .from(Prizes::Table, Prizes::EndRunId)
                            .to(SpeedRuns::Table, SpeedRuns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prizes_event_name_unique")
                    .table(Prizes::Table)
                    .col(Prizes::EventId)
                    .col(Prizes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeTickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeTickets::DonationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeTickets::PrizeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeTickets::Amount)
                            .decimal_len(20, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_ticket_donation")
                            .from(PrizeTickets::Table, PrizeTickets::DonationId)
                            .to(Donations::Table, Donations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_ticket_prize")
                            .from(PrizeTickets::Table, PrizeTickets::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prize_tickets_donation_prize_unique")
                    .table(PrizeTickets::Table)
                    .col(PrizeTickets::DonationId)
                    .col(PrizeTickets::PrizeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prize_tickets_prize")
                    .table(PrizeTickets::Table)
                    .col(PrizeTickets::PrizeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeWinners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeWinners::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::WinnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::PrizeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::PendingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::AcceptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::DeclineCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::EmailSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::AcceptEmailSentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::AcceptDeadline)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::ShippingState)
                            .string_len(32)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::ShippingEmailSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::TrackingNumber)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::ShippingCost)
                            .decimal_len(20, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PrizeWinners::WinnerNotes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_winner_donor")
                            .from(PrizeWinners::Table, PrizeWinners::WinnerId)
                            .to(Donors::Table, Donors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_winner_prize")
                            .from(PrizeWinners::Table, PrizeWinners::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // re-rolls bump counters on the one row per (prize, winner)
        manager
            .create_index(
                Index::create()
                    .name("idx_prize_winners_prize_winner_unique")
                    .table(PrizeWinners::Table)
                    .col(PrizeWinners::PrizeId)
                    .col(PrizeWinners::WinnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DonorPrizeEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DonorPrizeEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DonorPrizeEntries::DonorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DonorPrizeEntries::PrizeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DonorPrizeEntries::Weight)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("1.00"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donor_prize_entry_donor")
                            .from(DonorPrizeEntries::Table, DonorPrizeEntries::DonorId)
                            .to(Donors::Table, Donors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donor_prize_entry_prize")
                            .from(DonorPrizeEntries::Table, DonorPrizeEntries::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_donor_prize_entries_prize_donor_unique")
                    .table(DonorPrizeEntries::Table)
                    .col(DonorPrizeEntries::PrizeId)
                    .col(DonorPrizeEntries::DonorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeAllowedCountries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeAllowedCountries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeAllowedCountries::PrizeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeAllowedCountries::CountryId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_allowed_country_prize")
                            .from(PrizeAllowedCountries::Table, PrizeAllowedCountries::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_allowed_country_country")
                            .from(
                                PrizeAllowedCountries::Table,
                                PrizeAllowedCountries::CountryId,
                            )
                            .to(Countries::Table, Countries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prize_allowed_countries_unique")
                    .table(PrizeAllowedCountries::Table)
                    .col(PrizeAllowedCountries::PrizeId)
                    .col(PrizeAllowedCountries::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeDisallowedRegions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeDisallowedRegions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeDisallowedRegions::PrizeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeDisallowedRegions::RegionId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_disallowed_region_prize")
                            .from(
                                PrizeDisallowedRegions::Table,
                                PrizeDisallowedRegions::PrizeId,
                            )
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_disallowed_region_region")
                            .from(
                                PrizeDisallowedRegions::Table,
                                PrizeDisallowedRegions::RegionId,
                            )
                            .to(CountryRegions::Table, CountryRegions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prize_disallowed_regions_unique")
                    .table(PrizeDisallowedRegions::Table)
                    .col(PrizeDisallowedRegions::PrizeId)
                    .col(PrizeDisallowedRegions::RegionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PrizeDisallowedRegions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PrizeAllowedCountries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DonorPrizeEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PrizeWinners::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PrizeTickets::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;
        Ok(())
    }
}
